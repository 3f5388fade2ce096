//! Per-instance generator settings.

use std::borrow::Cow;

/// Settings carried by every generator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Label used in log events and `Debug` output.
    pub name: Cow<'static, str>,
    /// Check every yield and goto target against the resume table.
    ///
    /// A target outside a non-empty table ends the call with
    /// `GeneratorError::InvalidResumePoint` and exhausts the instance.
    pub validate_resume_points: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(Self::ANONYMOUS),
            validate_resume_points: cfg!(debug_assertions),
        }
    }
}

impl GeneratorConfig {
    /// Name used when none is given.
    pub const ANONYMOUS: &'static str = "<generator>";

    /// Create a default configuration with a name.
    #[inline]
    pub fn named<N: Into<Cow<'static, str>>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a configuration that never checks resume targets.
    #[inline]
    pub fn unchecked() -> Self {
        Self {
            validate_resume_points: false,
            ..Default::default()
        }
    }

    /// Create a configuration for testing (target checks always on).
    #[inline]
    pub fn for_testing() -> Self {
        Self {
            validate_resume_points: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.name, GeneratorConfig::ANONYMOUS);
        assert_eq!(config.validate_resume_points, cfg!(debug_assertions));
    }

    #[test]
    fn test_named_config() {
        let config = GeneratorConfig::named("fibonacci");
        assert_eq!(config.name, "fibonacci");

        let owned = GeneratorConfig::named(format!("worker-{}", 3));
        assert_eq!(owned.name, "worker-3");
    }

    #[test]
    fn test_unchecked_and_testing() {
        assert!(!GeneratorConfig::unchecked().validate_resume_points);
        assert!(GeneratorConfig::for_testing().validate_resume_points);
    }
}

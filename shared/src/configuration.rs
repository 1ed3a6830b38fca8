use crate::processor::DEFAULT_AMOUNT_THRESHOLD;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Orders pass the filter only when their amount is strictly greater than this.
    pub amount_threshold: f64,
    /// Report a batch with failed records as a `partial` success instead of an error.
    pub partial_success: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            amount_threshold: DEFAULT_AMOUNT_THRESHOLD,
            partial_success: false,
        }
    }
}

impl Configuration {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            // .merge overrides the defaults with anything set in the environment
            .merge(Env::prefixed("APP_"))
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "amount_threshold={}, partial_success={}",
            self.amount_threshold, self.partial_success
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::configuration::Configuration;

    #[test]
    fn when_environment_is_empty_should_use_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Configuration::load()?;

            assert_eq!(config, Configuration::default());
            assert_eq!(config.amount_threshold, 100.0);
            assert!(!config.partial_success);

            Ok(())
        });
    }

    #[test]
    fn when_environment_overrides_values_should_load_them() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_AMOUNT_THRESHOLD", "250.5");
            jail.set_env("APP_PARTIAL_SUCCESS", "true");

            let config = Configuration::load()?;

            assert_eq!(config.amount_threshold, 250.5);
            assert!(config.partial_success);

            Ok(())
        });
    }

    #[test]
    fn when_threshold_is_not_a_number_should_fail() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_AMOUNT_THRESHOLD", "plenty");

            assert!(Configuration::load().is_err());

            Ok(())
        });
    }
}

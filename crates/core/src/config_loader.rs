use crate::config::DexConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from built-in defaults, `config/Dex.toml` and
    /// `DEX_`-prefixed environment variables, later sources winning.
    ///
    /// Nested keys use a double underscore, e.g. `DEX_ENGINE__FEE_RATE=0.01`.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed.
    pub fn load() -> Result<DexConfig> {
        Self::load_from("config/Dex.toml")
    }

    /// Same as [`ConfigLoader::load`] with an explicit TOML file.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<DexConfig> {
        let config: DexConfig = Figment::from(Serialized::defaults(DexConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DEX_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn file_and_env_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "Dex.toml",
                r#"
                [engine]
                fee_rate = "0.01"

                [session]
                starting_balance = "500"
                "#,
            )?;
            jail.set_env("DEX_MARKET__INITIAL_RESERVE_BASE", "2000");

            let config = ConfigLoader::load_from("Dex.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.engine.fee_rate, dec!(0.01));
            assert_eq!(config.engine.dust_threshold, dec!(0.0001));
            assert_eq!(config.session.starting_balance, dec!(500));
            assert_eq!(config.market.initial_reserve_base, dec!(2000));
            assert_eq!(config.market.initial_reserve_tokens, dec!(1000000));
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        figment::Jail::expect_with(|_| {
            let config = ConfigLoader::load_from("absent.toml").map_err(|e| e.to_string())?;
            assert_eq!(config, DexConfig::default());
            Ok(())
        });
    }
}

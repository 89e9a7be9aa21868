// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{
    fail::{
        Fail,
        FailKind,
    },
    network::config::KcpConfig,
};
use ::std::{
    fs::File,
    io::Read,
    ops::Index,
    str::FromStr,
};
use ::yaml_rust::{
    Yaml,
    YamlLoader,
};

//======================================================================================================================
// Constants
//======================================================================================================================

// Protocol options. Every one of them is optional.
mod kcp_config {
    pub const SECTION_NAME: &str = "kcp";
    // Prefix of the environment variables that override the configuration file.
    pub const ENV_PREFIX: &str = "KCP_";
    pub const MTU: &str = "mtu";
    pub const SEND_WINDOW: &str = "send_window";
    pub const RECEIVE_WINDOW: &str = "receive_window";
    pub const NODELAY: &str = "nodelay";
    pub const INTERVAL: &str = "interval";
    pub const FAST_RESEND: &str = "fast_resend";
    pub const CONGESTION_CONTROL: &str = "congestion_control";
    pub const MIN_RTO: &str = "min_rto";
    pub const STREAM: &str = "stream";
    pub const DEAD_LINK: &str = "dead_link";
}

//======================================================================================================================
// Structures
//======================================================================================================================

/// Configuration file.
#[derive(Clone, Debug)]
pub struct Config(pub Yaml);

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl Config {
    /// Reads a configuration file into a [Config] object.
    pub fn new(config_path: String) -> Result<Self, Fail> {
        let mut config_s: String = String::new();
        File::open(&config_path)?.read_to_string(&mut config_s)?;
        Self::from_yaml_str(&config_s)
    }

    /// Parses a configuration document held in memory.
    pub fn from_yaml_str(config_s: &str) -> Result<Self, Fail> {
        let config: Vec<Yaml> = match YamlLoader::load_from_str(config_s) {
            Ok(config) => config,
            Err(e) => {
                let cause: String = format!("failed to parse configuration: {:?}", e);
                error!("from_yaml_str(): {}", cause);
                return Err(Fail::from_kind(FailKind::InvalidArgument, &cause));
            },
        };
        let config_obj: &Yaml = match &config[..] {
            &[ref c] => c,
            _ => return Err(Fail::from_kind(FailKind::InvalidArgument, "Wrong number of config objects")),
        };

        Ok(Self(config_obj.clone()))
    }

    /// Builds a [KcpConfig] out of the "kcp" section. Environment variables take precedence over the file, and a
    /// missing section yields the default configuration.
    pub fn kcp_config(&self) -> Result<KcpConfig, Fail> {
        let section: Option<&Yaml> = self.get_kcp_section()?;
        KcpConfig::new(
            Self::get_int_option(section, kcp_config::MTU)?,
            Self::get_int_option(section, kcp_config::SEND_WINDOW)?,
            Self::get_int_option(section, kcp_config::RECEIVE_WINDOW)?,
            Self::get_int_option(section, kcp_config::NODELAY)?,
            Self::get_int_option(section, kcp_config::INTERVAL)?,
            Self::get_int_option(section, kcp_config::FAST_RESEND)?,
            Self::get_bool_option(section, kcp_config::CONGESTION_CONTROL)?,
            Self::get_int_option(section, kcp_config::MIN_RTO)?,
            Self::get_bool_option(section, kcp_config::STREAM)?,
            Self::get_int_option(section, kcp_config::DEAD_LINK)?,
        )
    }

    fn get_kcp_section(&self) -> Result<Option<&Yaml>, Fail> {
        let section: &Yaml = self.0.index(kcp_config::SECTION_NAME);
        match section {
            Yaml::BadValue => Ok(None),
            Yaml::Hash(_) => Ok(Some(section)),
            _ => {
                let message: String = format!("parameter \"{}\" has unexpected type", kcp_config::SECTION_NAME);
                Err(Fail::from_kind(FailKind::InvalidArgument, &message))
            },
        }
    }

    //==================================================================================================================
    // Static Functions
    //==================================================================================================================

    /// Index `yaml` to find the value at `index`. Missing values are not an error.
    fn get_option<'a>(yaml: Option<&'a Yaml>, index: &str) -> Option<&'a Yaml> {
        match yaml?.index(index) {
            Yaml::BadValue => None,
            value => Some(value),
        }
    }

    /// Get value where the environment value overrides the config file if it exists.
    fn get_typed_env_option<T: FromStr>(index: &str) -> Result<Option<T>, Fail> {
        let name: String = format!("{}{}", kcp_config::ENV_PREFIX, index.to_uppercase());
        if let Ok(var) = ::std::env::var(&name) {
            if let Ok(value) = var.as_str().parse() {
                return Ok(Some(value));
            } else {
                let message: String = format!("parameter {} has unexpected type", name);
                return Err(Fail::from_kind(FailKind::InvalidArgument, &message));
            }
        }
        Ok(None)
    }

    /// Reads an integer option, verifying that the destination type may hold it.
    fn get_int_option<T: TryFrom<i64> + FromStr>(yaml: Option<&Yaml>, index: &str) -> Result<Option<T>, Fail> {
        if let Some(value) = Self::get_typed_env_option(index)? {
            return Ok(Some(value));
        }
        let val: i64 = match Self::get_option(yaml, index) {
            Some(option) => match option.as_i64() {
                Some(val) => val,
                None => {
                    let message: String = format!("parameter {} has unexpected type", index);
                    return Err(Fail::from_kind(FailKind::InvalidArgument, &message));
                },
            },
            None => return Ok(None),
        };
        match T::try_from(val) {
            Ok(val) => Ok(Some(val)),
            _ => {
                let message: String = format!("parameter \"{}\" is out of range", index);
                Err(Fail::new(libc::ERANGE, message.as_str()))
            },
        }
    }

    /// Reads a boolean option.
    fn get_bool_option(yaml: Option<&Yaml>, index: &str) -> Result<Option<bool>, Fail> {
        if let Some(value) = Self::get_typed_env_option(index)? {
            return Ok(Some(value));
        }
        match Self::get_option(yaml, index) {
            Some(option) => match option.as_bool() {
                Some(val) => Ok(Some(val)),
                None => {
                    let message: String = format!("parameter {} has unexpected type", index);
                    Err(Fail::from_kind(FailKind::InvalidArgument, &message))
                },
            },
            None => Ok(None),
        }
    }
}

//======================================================================================================================
// Unit Tests
//======================================================================================================================

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::runtime::{
        fail::FailKind,
        network::config::KcpConfig,
    };
    use ::anyhow::Result;

    #[test]
    fn reads_kcp_section() -> Result<()> {
        let config: Config = Config::from_yaml_str(
            "kcp:\n  mtu: 1200\n  send_window: 64\n  nodelay: 1\n  interval: 20\n  fast_resend: 2\n  \
             congestion_control: false\n  stream: true\n",
        )?;
        let kcp: KcpConfig = config.kcp_config()?;
        crate::ensure_eq!(kcp.get_mtu(), 1200);
        crate::ensure_eq!(kcp.get_send_window(), 64);
        crate::ensure_eq!(kcp.get_receive_window(), 128);
        crate::ensure_eq!(kcp.get_nodelay(), 1);
        crate::ensure_eq!(kcp.get_interval(), 20);
        crate::ensure_eq!(kcp.get_fast_resend(), 2);
        crate::ensure_eq!(kcp.get_congestion_control(), false);
        crate::ensure_eq!(kcp.get_stream(), true);
        Ok(())
    }

    #[test]
    fn missing_section_yields_defaults() -> Result<()> {
        let config: Config = Config::from_yaml_str("other:\n  key: 1\n")?;
        crate::ensure_eq!(config.kcp_config()?, KcpConfig::default());
        Ok(())
    }

    #[test]
    fn rejects_mistyped_values() -> Result<()> {
        let config: Config = Config::from_yaml_str("kcp:\n  receive_window: lots\n")?;
        crate::ensure_eq!(config.kcp_config().map_err(|e| e.kind()), Err(FailKind::InvalidArgument));

        let config: Config = Config::from_yaml_str("kcp:\n  nodelay: 1000\n")?;
        crate::ensure_eq!(config.kcp_config().map_err(|e| e.errno), Err(libc::ERANGE));
        Ok(())
    }
}

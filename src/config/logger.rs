use envconfig::Envconfig;
use strum::EnumString;

#[derive(EnumString, Debug, Clone, Copy)]
#[strum(ascii_case_insensitive)]
pub enum LogFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Envconfig, Debug)]
pub struct LoggerConfig {
    #[envconfig(from = "RUST_LOG_FORMAT", default = "json")]
    pub format: LogFormat,
}

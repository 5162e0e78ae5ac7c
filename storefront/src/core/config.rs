use crate::orders::FeeSchedule;
use std::path::PathBuf;
use thiserror::Error;
use woo_client::WooConfig;

/// Database file inside the work directory
const DB_FILE: &str = "storefront.redb";

/// 配置错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// 店面配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (未设置时输出到终端) |
/// | WOOCOMMERCE_URL | - | 远程平台站点地址 |
/// | WOOCOMMERCE_CONSUMER_KEY | - | OAuth consumer key |
/// | WOOCOMMERCE_CONSUMER_SECRET | - | OAuth consumer secret |
/// | REQUEST_TIMEOUT_SECS | 30 | 请求超时(秒) |
/// | DELIVERY_HOME_CITY | Dhaka | 同城配送城市 |
/// | DELIVERY_INSIDE_CITY_FEE | 60 | 同城运费 |
/// | DELIVERY_OUTSIDE_CITY_FEE | 120 | 外地运费 |
/// | DELIVERY_EXPRESS_SURCHARGE | 50 | 加急附加费 |
/// | FREE_DELIVERY_THRESHOLD | 2000 | 免运费门槛 |
///
/// Remote settings may be absent; only outbound calls fail then.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// 工作目录
    pub work_dir: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 远程平台连接配置
    pub woo: WooConfig,
    /// 运费规则
    pub fees: FeeSchedule,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            work_dir: "./data".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            woo: WooConfig::default().with_timeout(30),
            fees: FeeSchedule::default(),
        }
    }
}

impl StoreConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let woo = WooConfig {
            base_url: var("WOOCOMMERCE_URL"),
            consumer_key: var("WOOCOMMERCE_CONSUMER_KEY"),
            consumer_secret: var("WOOCOMMERCE_CONSUMER_SECRET"),
            timeout: var("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.woo.timeout),
        };

        let fee = |name: &'static str, default: f64| -> Result<f64, ConfigError> {
            match var(name) {
                None => Ok(default),
                Some(raw) => {
                    let parsed = raw
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && *v >= 0.0);
                    parsed.ok_or(ConfigError::InvalidValue { name, value: raw })
                }
            }
        };

        let base = defaults.fees;
        let fees = FeeSchedule {
            home_city: var("DELIVERY_HOME_CITY").unwrap_or(base.home_city),
            inside_city_fee: fee("DELIVERY_INSIDE_CITY_FEE", base.inside_city_fee)?,
            outside_city_fee: fee("DELIVERY_OUTSIDE_CITY_FEE", base.outside_city_fee)?,
            express_surcharge: fee("DELIVERY_EXPRESS_SURCHARGE", base.express_surcharge)?,
            free_delivery_threshold: fee("FREE_DELIVERY_THRESHOLD", base.free_delivery_threshold)?,
        };

        Ok(Self {
            work_dir: var("WORK_DIR").unwrap_or(defaults.work_dir),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: var("LOG_DIR"),
            woo,
            fees,
        })
    }

    /// 使用自定义工作目录 (常用于测试)
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// 数据库文件路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(DB_FILE)
    }
}

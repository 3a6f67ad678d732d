//! 全局配置管理,存储分析引擎所有可配置项

/// 分析引擎配置
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    // 条件结果表在源码中的名称（如 utag.cond / c）
    pub condition_tables: Vec<String>,
    // 数据层表在源码中的名称（如 d / b / utag.data）
    pub data_tables: Vec<String>,
    // loader 配置对象字面量的赋值锚点
    pub loader_cfg_anchor: String,
    // 是否为每条加载规则解析可读条件
    pub parse_conditions: bool,
    // 是否扫描标签配置补全未上报的加载规则
    pub scan_unreported_rules: bool,
    // 协议相对路径（//host/...）补全时使用的协议
    pub default_scheme: String,
    // 条件表达式递归拆分的最大深度
    pub max_condition_depth: usize,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            condition_tables: vec!["utag.cond".to_string(), "c".to_string()],
            data_tables: vec!["d".to_string(), "b".to_string(), "utag.data".to_string()],
            loader_cfg_anchor: "utag.loader.cfg".to_string(),
            parse_conditions: true,
            scan_unreported_rules: true,
            default_scheme: "https".to_string(),
            max_condition_depth: 16,
            verbose: false,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: AnalyzerConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    pub fn condition_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.condition_tables = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn data_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.data_tables = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn loader_cfg_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.config.loader_cfg_anchor = anchor.into();
        self
    }

    pub fn parse_conditions(mut self, enabled: bool) -> Self {
        self.config.parse_conditions = enabled;
        self
    }

    pub fn scan_unreported_rules(mut self, enabled: bool) -> Self {
        self.config.scan_unreported_rules = enabled;
        self
    }

    pub fn default_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.default_scheme = scheme.into();
        self
    }

    pub fn max_condition_depth(mut self, depth: usize) -> Self {
        self.config.max_condition_depth = depth;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

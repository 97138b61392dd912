use std::fmt;

use thiserror::Error;

/// 应用程序错误类型
///
/// 每个业务组件对应一个子错误类型，顶层只做包装和转发。
/// 注意：成绩册中未匹配到的学生ID不是错误，
/// 它作为 `MergeReport` 的数据返回给调用方，单独提示。
#[derive(Debug)]
pub enum AppError {
    /// 数据加载错误（参考答案库 / 成绩文件 / 成绩册工作簿）
    Load(LoadError),
    /// 答卷结构错误（找不到ID列或题目起始列）
    Schema(SchemaError),
    /// 评分服务错误（仅在单题范围内出现，不会中断整行评分）
    Oracle(OracleError),
    /// 成绩册列容量错误（讲次编号超出列表）
    Capacity(CapacityError),
    /// 结果写出错误
    Write(WriteError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Load(e) => write!(f, "加载错误: {}", e),
            AppError::Schema(e) => write!(f, "答卷结构错误: {}", e),
            AppError::Oracle(e) => write!(f, "评分服务错误: {}", e),
            AppError::Capacity(e) => write!(f, "成绩册容量错误: {}", e),
            AppError::Write(e) => write!(f, "写出错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Load(e) => Some(e),
            AppError::Schema(e) => Some(e),
            AppError::Oracle(e) => Some(e),
            AppError::Capacity(e) => Some(e),
            AppError::Write(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 数据加载错误
///
/// 参考答案库、成绩CSV、成绩册工作簿的读取与校验失败都归入此类。
/// 校验失败必须指明具体出错的行，而不是笼统的"加载失败"。
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败 ({path}): {message}")]
    ReadFailed { path: String, message: String },

    #[error("缺少必需列: {missing:?}（实际表头: {found:?}）")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("第 {row} 行 {field} 格式非法: '{value}'（期望形如 {expected}）")]
    InvalidId {
        row: usize,
        field: String,
        value: String,
        expected: String,
    },

    #[error("第 {row} 行分数无法解析: '{value}'")]
    InvalidScore { row: usize, value: String },

    #[error("工作簿中没有工作表: {0}")]
    NoWorksheet(String),
}

/// 答卷结构错误
///
/// 上传的答卷表格无法对齐到参考题目时中止整次评分。
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("未找到学生ID列（表头中不含标记 '{marker}'）")]
    IdentifierColumnNotFound { marker: String },

    #[error("未找到题目起始列（表头中既无标记 '{marker}'，也无 '1.' 开头的列）")]
    QuestionStartNotFound { marker: String },

    #[error("答卷没有数据行")]
    EmptyTable,
}

/// 评分服务错误
///
/// 单题评分失败一律被吸收为 0 分记录，此类型只进入 rationale 文本，
/// 从不向上传播中断整行。
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("LLM API 调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },

    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },

    #[error("LLM 响应中没有数字分数: '{response}'")]
    NoNumericToken { response: String },

    #[error("评分超时（{timeout_secs} 秒）")]
    Timeout { timeout_secs: u64 },
}

/// 成绩册列容量错误
///
/// 模板只定义了固定数量的讲次列，越界编号直接报错而不是静默截断。
#[derive(Error, Debug)]
#[error("讲次编号 {lecture_index} 超出模板列表（容量 {capacity}），模板中没有对应的列")]
pub struct CapacityError {
    pub lecture_index: usize,
    pub capacity: usize,
}

/// 结果写出错误
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("写入文件失败 ({path}): {message}")]
    FileWriteFailed { path: String, message: String },

    #[error("创建输出目录失败 ({path}): {message}")]
    DirCreateFailed { path: String, message: String },

    #[error("打包归档失败 ({path}): {message}")]
    ArchiveFailed { path: String, message: String },

    #[error("保存工作簿失败 ({path}): {message}")]
    BookSaveFailed { path: String, message: String },
}

// ========== 从子错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::Load(err)
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Schema(err)
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        AppError::Oracle(err)
    }
}

impl From<CapacityError> for AppError {
    fn from(err: CapacityError) -> Self {
        AppError::Capacity(err)
    }
}

impl From<WriteError> for AppError {
    fn from(err: WriteError) -> Self {
        AppError::Write(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl LoadError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, source: impl std::error::Error) -> Self {
        LoadError::ReadFailed {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl WriteError {
    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: impl std::error::Error) -> Self {
        WriteError::FileWriteFailed {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

//! Schema 层：函数调用注册表、位置参数表与 --help 引导生成

pub mod bootstrap;
pub mod positional;
pub mod registry;

pub use bootstrap::bootstrap_schema;
pub use positional::PositionalSpec;
pub use registry::{FunctionSchema, ParameterKind, ParameterObject, ParameterSpec, SchemaRegistry};

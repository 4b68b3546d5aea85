//! # Probe Core
//!
//! Environment introspection for a serverless function that echoes its own
//! execution environment back to the caller.
//!
//! ## Pipeline
//!
//! ```text
//! Invocation (env snapshot, request event, context, settings)
//!     │
//!     ├──> Sanitizer
//!     │      └─> masked env, placeholder identifiers, projected settings
//!     │
//!     ├──> PathResolver (NODE_PATH)
//!     │      └─> node_modules dirs with an @aws-sdk scope
//!     │
//!     ├──> DependencyScanner + VersionReader (fan-out per dir / package)
//!     │      └─> @aws-sdk/<name> -> version | "<UNKNOWN>"
//!     │
//!     └──> ReportAssembler
//!            └─> {statusCode: 200, body} | {statusCode: 500, error envelope}
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use probe_core::{assemble, snapshot_process_env, InvocationContext, ProbeInput, Settings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let env = snapshot_process_env();
//!     let input = ProbeInput {
//!         settings: Settings::from_env(&env),
//!         env,
//!         event: serde_json::json!({"requestContext": {
//!             "accountId": "offline", "apiId": "private",
//!             "domainName": "localhost", "domainPrefix": "localhost"
//!         }}),
//!         context: InvocationContext::default(),
//!         search_path: None,
//!     };
//!     let response = assemble(input).await;
//!     println!("{}", response.body);
//! }
//! ```

mod context;
mod environment;
mod error;
mod path_resolver;
mod report;
mod sanitize;
mod scanner;
mod version;

pub use context::{extract_account_id_from_function_arn, InvocationContext};
pub use environment::{search_path, snapshot_process_env, EnvironmentMap, Settings, SEARCH_PATH_VAR};
pub use error::{ProbeError, Result};
pub use path_resolver::{
    resolve_candidates, validate_candidate, CandidateRejection, MODULES_DIR_NAME,
    SEARCH_PATH_SEPARATOR, SDK_SCOPE,
};
pub use report::{assemble, build_report, error_body, DiagnosticReport, ProbeInput};
pub use sanitize::{
    is_allowed_key, is_secret_key, sanitize_context, sanitize_env, sanitize_event,
    sanitize_settings, SettingsView, MASK, PLACEHOLDER_ACCOUNT_ID, PLACEHOLDER_API_ID,
};
pub use scanner::{scan_search_path, DependencyReport, DependencyScanner, PackageVersions};
pub use version::{read_version, MANIFEST_FILE, UNKNOWN_VERSION};

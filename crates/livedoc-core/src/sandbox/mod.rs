//! Sandboxed snippet execution.
//!
//! - [`backend`]: `SandboxBackend` trait, `SandboxHandle`, `DisabledBackend`
//! - [`local`]: interpreters in a temporary directory
//! - [`remote`]: hosted sandbox service over HTTP
//! - [`execution`]: `ExecutionControls`, `CircuitBreaker`, `run_with_controls()`
//! - [`executor`]: `SandboxExecutor`: lazy lifecycle and batched runs
//! - [`error`]: `SandboxError` / `SandboxResult`

pub mod backend;
pub mod error;
pub mod execution;
pub mod executor;
pub mod local;
pub mod remote;

pub use backend::{DisabledBackend, SandboxBackend, SandboxHandle};
pub use error::{SandboxError, SandboxResult};
pub use execution::{run_with_controls, CircuitBreaker, Controlled, ExecutionControls};
pub use executor::{SandboxExecutor, CREATE_FAILED};
pub use local::{interpreter_for, Interpreter, LocalProcessBackend};
pub use remote::RemoteSandboxBackend;

// src/session/request.rs

//! The immutable description of one generation run.

use thiserror::Error;
use tracing::warn;

/// Everything the caller supplies for a single invocation.
///
/// `operator` and `source_paths` are required; everything else is optional.
/// The API fields are passed through to the script as opaque strings and
/// never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Operator name, e.g. `AllGatherMatmul`.
    pub operator: String,
    /// Operator source directories, in caller order.
    pub source_paths: Vec<String>,
    /// Explicit script override; empty/None falls back to the configured or
    /// well-known default.
    pub script: Option<String>,
    /// Few-shot example file.
    pub fewshot_file: Option<String>,
    /// Output file for generated testcases (full contract only).
    pub output_file: Option<String>,
    /// Prompt file (full contract only).
    pub prompt_file: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Run inside an activated virtual environment when one is found.
    pub use_venv: bool,
}

/// Validation failures detected before any event stream exists.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("operator name must not be empty")]
    EmptyOperator,
    #[error("at least one source path is required")]
    NoSourcePaths,
}

fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl RunRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.operator.trim().is_empty() {
            return Err(RequestError::EmptyOperator);
        }
        if self.source_paths.is_empty() {
            return Err(RequestError::NoSourcePaths);
        }
        Ok(())
    }

    /// Whether this request carries the full positional contract of the
    /// generation stage (output file, prompt file, few-shot file, API key,
    /// base URL, model name).
    pub fn has_full_contract(&self) -> bool {
        [
            &self.output_file,
            &self.prompt_file,
            &self.fewshot_file,
            &self.api_key,
            &self.base_url,
            &self.model,
        ]
        .into_iter()
        .all(|f| filled(f).is_some())
    }

    /// Assemble the positional argument list for the script.
    ///
    /// `resolve` maps a user-supplied path string to its absolute form; it
    /// is applied to the few-shot file and the source paths, while the API
    /// fields and output/prompt files pass through untouched.
    ///
    /// Two contracts exist, both positional:
    /// - full (all richer fields present):
    ///   `operator output prompt fewshot api_key base_url model sources...`
    /// - wrapper: `operator [fewshot] sources...`
    ///
    /// A partially filled richer field set degrades to the wrapper contract.
    pub fn positional_args<F>(&self, resolve: F) -> Vec<String>
    where
        F: Fn(&str) -> String,
    {
        let mut args = vec![self.operator.clone()];

        if self.has_full_contract() {
            args.push(self.output_file.clone().unwrap_or_default());
            args.push(self.prompt_file.clone().unwrap_or_default());
            args.push(resolve(self.fewshot_file.as_deref().unwrap_or_default()));
            args.push(self.api_key.clone().unwrap_or_default());
            args.push(self.base_url.clone().unwrap_or_default());
            args.push(self.model.clone().unwrap_or_default());
        } else {
            let richer_present = [
                &self.output_file,
                &self.prompt_file,
                &self.api_key,
                &self.base_url,
                &self.model,
            ]
            .into_iter()
            .any(|f| filled(f).is_some());
            if richer_present {
                warn!(
                    "incomplete API/output fields; falling back to the \
                     wrapper argument contract"
                );
            }

            if let Some(fewshot) = filled(&self.fewshot_file) {
                args.push(resolve(fewshot));
            }
        }

        args.extend(self.source_paths.iter().map(|p| resolve(p)));
        args
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all mmp-related errors. This should be the *only* error
//! enum that the binary sees.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmpError {
    #[error("{0}")]
    Params(#[from] crate::params::ParamsError),

    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Couldn't decode the raw deployment '{}': {err}", .file.display())]
    RawDeployment {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Couldn't write TOML: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Couldn't set up logging: {0}")]
    Logging(#[from] log::SetLoggerError),

    #[error("{0}")]
    IO(#[from] std::io::Error),
}

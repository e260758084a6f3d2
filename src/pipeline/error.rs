// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors that stop a deployment run.

use thiserror::Error;

use crate::current_meter::CurrentMeterError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    CurrentMeter(#[from] CurrentMeterError),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Processing software for McLane Moored Profiler (MMP) data.

Raw CTD, engineering and acoustic current-meter profiles are given
timestamps, corrected, synchronised onto the CTD's pressure, screened and
reduced onto pressure grids.
 */

pub mod binning;
mod cli;
pub mod collection;
pub mod constants;
pub mod current_meter;
mod error;
pub mod filter;
pub(crate) mod math;
pub mod params;
pub mod pipeline;
pub mod profile;
pub mod sync;
pub mod timestamps;
pub mod voiding;

// Re-exports.
pub use cli::Mmp;
pub use collection::ProfileCollection;
pub use error::MmpError;
pub use pipeline::{process_deployment, DeploymentProducts, RawDeployment};
pub use profile::{Channel, Instrument, ProcessingStage, Profile};

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? Only the binary sets this.
pub static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);

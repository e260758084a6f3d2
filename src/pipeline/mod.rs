// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Processing a whole deployment.

The stages run in this order, each over every profile in parallel:

1. CTD: timestamps from the engineering record, profiling velocity, mask.
2. Engineering: backtrack policy, then CTD pressure and mask.
3. Current meter: the correction chain, then CTD pressure and mask, then
   slow-sample masking.
4. Short-profile voiding on every instrument.
5. Padded and flat layouts of every instrument's processed channels.
6. Binning of every instrument onto its pressure grid.

Profile `n` of one instrument is only ever paired with profile `n` of
another.
 */

mod error;

pub use error::PipelineError;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    binning::{bin_collection, BinnedGrid, BinningParams},
    collection::{AggregatedChannels, ProfileCollection},
    current_meter::{process_current_meter, AmbiguityRecord, CurrentMeterError},
    math::gradient,
    params::{CtdParams, CurrentMeterParams, DeploymentParams, EngParams},
    profile::{Channel, Instrument, ProcessingStage, Profile, VoidState},
    sync::{aqd_sync_ctd, mask_slow_samples, sync_ctd_eng},
    timestamps::add_ctd_timestamps,
    voiding::{flag_backtracks, void_short_profiles},
    PROGRESS_BARS,
};

/// Raw profiles of one deployment, as handed over by the importer. The
/// profiles of each instrument may be in any order and have gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDeployment {
    pub ctd: Vec<Profile>,
    pub eng: Vec<Profile>,
    pub current_meter: Vec<Profile>,
}

/// Everything a deployment run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentProducts {
    pub ctd: ProfileCollection,
    pub eng: ProfileCollection,
    pub current_meter: ProfileCollection,

    /// Every phase-ambiguous beam velocity found, corrected or not.
    pub ambiguities: Vec<AmbiguityRecord>,

    /// The processed channels of each instrument, NaN-padded and
    /// concatenated, in the order CTD, engineering, current meter.
    pub aggregated: Vec<AggregatedChannels>,

    /// One grid per instrument, in the order CTD, engineering, current meter.
    pub binned: Vec<BinnedGrid>,
}

impl DeploymentProducts {
    pub fn collection(&self, instrument: Instrument) -> Option<&ProfileCollection> {
        [&self.ctd, &self.eng, &self.current_meter]
            .into_iter()
            .find(|c| c.instrument == instrument)
    }

    pub fn aggregated(&self, instrument: Instrument) -> Option<&AggregatedChannels> {
        self.aggregated.iter().find(|a| a.instrument == instrument)
    }

    pub fn binned_grid(&self, instrument: Instrument) -> Option<&BinnedGrid> {
        self.binned.iter().find(|g| g.instrument == instrument)
    }
}

fn profile_progress_bar(num_profiles: usize, message: &'static str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(
            "{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} profiles ({elapsed_precise}<{eta_precise})",
        )
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(num_profiles as _)
        .with_style(style)
        .with_position(0)
        .with_message(message)
}

/// Run every processing stage on a deployment.
///
/// Per-profile problems are recorded in the profiles' statuses and never
/// stop the run. Only current-meter data that can't be interpreted at all
/// is an error.
pub fn process_deployment(
    raw: RawDeployment,
    params: &DeploymentParams,
) -> Result<DeploymentProducts, PipelineError> {
    let deployment_id = if params.deployment_id.is_empty() {
        [&raw.ctd, &raw.eng, &raw.current_meter]
            .into_iter()
            .flatten()
            .map(|p| p.deployment_id.clone())
            .find(|id| !id.is_empty())
            .unwrap_or_default()
    } else {
        params.deployment_id.clone()
    };
    let cm_instrument = params.current_meter.kind.instrument();

    let mut ctd = ProfileCollection::from_profiles(Instrument::Ctd, &deployment_id, raw.ctd);
    let mut eng = ProfileCollection::from_profiles(Instrument::Eng, &deployment_id, raw.eng);
    let mut current_meter =
        ProfileCollection::from_profiles(cm_instrument, &deployment_id, raw.current_meter);
    let num_profiles = ctd.len().max(eng.len()).max(current_meter.len());
    for c in [&mut ctd, &mut eng, &mut current_meter] {
        c.extend_to(num_profiles as u32);
    }
    info!("Deployment '{deployment_id}': {num_profiles} profiles; current meter is the {cm_instrument}");

    if let Some(range) = params.profile_range() {
        info!("Processing profiles {}..={}", range.start(), range.end());
        for c in [&mut ctd, &mut eng, &mut current_meter] {
            c.select_range(&range);
        }
    }

    let multi_progress = MultiProgress::with_draw_target(if PROGRESS_BARS.load() {
        ProgressDrawTarget::stdout()
    } else {
        ProgressDrawTarget::hidden()
    });
    let ctd_progress = multi_progress.add(profile_progress_bar(num_profiles, "CTD"));
    let eng_progress = multi_progress.add(profile_progress_bar(num_profiles, "Engineering"));
    let cm_progress = multi_progress.add(profile_progress_bar(num_profiles, "Current meter"));

    let ctd_gamma = params.ctd_timestamp_gamma();
    debug!("CTD timestamp gamma: {ctd_gamma} s");
    ctd.par_iter_mut().for_each(|p| {
        process_ctd_profile(p, eng.get(p.profile_number), &params.ctd, ctd_gamma);
        ctd_progress.inc(1);
    });
    ctd_progress.finish_with_message("CTD done");
    info!(
        "CTD: {} profiles timestamped",
        ctd.iter()
            .filter(|p| p.column(Channel::Time).iter().any(|t| t.is_finite()))
            .count()
    );

    eng.par_iter_mut().for_each(|p| {
        process_eng_profile(p, ctd.get(p.profile_number), &params.eng);
        eng_progress.inc(1);
    });
    eng_progress.finish_with_message("Engineering done");

    let ambiguities: Vec<Vec<AmbiguityRecord>> = current_meter
        .par_iter_mut()
        .map(|p| {
            let records = process_current_meter_profile(
                p,
                ctd.get(p.profile_number),
                &params.current_meter,
            );
            cm_progress.inc(1);
            records
        })
        .collect::<Result<_, _>>()?;
    cm_progress.finish_with_message("Current meter done");
    let ambiguities: Vec<AmbiguityRecord> = ambiguities.into_iter().flatten().collect();
    info!(
        "{cm_instrument}: {} ambiguous beam velocities",
        ambiguities.len()
    );

    for c in [&mut ctd, &mut eng, &mut current_meter] {
        let num_voided = c
            .par_iter_mut()
            .map(|p| void_short_profiles(p, &params.voiding))
            .filter(|&s| s == VoidState::Voided)
            .count();
        info!(
            "{}: {num_voided} of {} profiles voided",
            c.instrument,
            c.len()
        );
    }

    let aggregated = [&ctd, &eng, &current_meter]
        .into_iter()
        .map(|c| c.aggregate(ProcessingStage::Processed.active_channels(c.instrument)))
        .collect();

    let binned = [&ctd, &eng, &current_meter]
        .into_iter()
        .map(|c| {
            let grid = BinningParams::derive_for_collection(
                params.binning.for_instrument(c.instrument),
                c,
            );
            debug!("{} binning grid: {grid:?}", c.instrument);
            bin_collection(c, ProcessingStage::Binned.active_channels(c.instrument), &grid)
        })
        .collect();

    Ok(DeploymentProducts {
        ctd,
        eng,
        current_meter,
        ambiguities,
        aggregated,
        binned,
    })
}

fn usable_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Timestamps, profiling velocity, a fresh mask and the direction.
fn process_ctd_profile(
    ctd: &mut Profile,
    eng: Option<&Profile>,
    params: &CtdParams,
    timestamp_gamma_s: f64,
) {
    if ctd.is_voided() {
        ctd.advance_stage(ProcessingStage::Processed);
        return;
    }
    if usable_rate(ctd.acquisition_rate_hz).is_none() {
        ctd.acquisition_rate_hz = params.acquisition_rate_hz;
    }
    if let Some(eng) = eng {
        add_ctd_timestamps(ctd, eng, timestamp_gamma_s);
    }

    ctd.advance_stage(ProcessingStage::Processed);
    let pressure = ctd.column_vec(Channel::Pressure);
    if !pressure.is_empty() {
        let spacing = usable_rate(ctd.acquisition_rate_hz)
            .or_else(|| usable_rate(params.acquisition_rate_hz))
            .map_or(f64::NAN, |rate| 1.0 / rate);
        ctd.set_column(Channel::Dpdt, gradient(&pressure, spacing).into());
    }
    ctd.reset_mask();
    ctd.infer_direction();
}

fn process_eng_profile(eng: &mut Profile, ctd: Option<&Profile>, params: &EngParams) {
    if !eng.is_voided() {
        if eng.mask.len() != eng.num_samples() {
            eng.reset_mask();
        }
        flag_backtracks(
            eng,
            params.backtrack_code,
            params.backtrack_margin_s,
            params.backtrack_speed_threshold_dbar_s,
        );
    }
    if !eng.is_voided() {
        if let Some(ctd) = ctd {
            sync_ctd_eng(eng, ctd, params.depth_offset_dbar);
        }
    }
    eng.advance_stage(ProcessingStage::Processed);
}

fn process_current_meter_profile(
    cm: &mut Profile,
    ctd: Option<&Profile>,
    params: &CurrentMeterParams,
) -> Result<Vec<AmbiguityRecord>, CurrentMeterError> {
    let mut records = vec![];
    if !cm.is_voided() {
        records = process_current_meter(cm, params)?;
        if let Some(ctd) = ctd {
            aqd_sync_ctd(cm, ctd, params.depth_offset_dbar);
        }
        mask_slow_samples(cm, params.min_speed_dbar_s);
    }
    cm.advance_stage(ProcessingStage::Processed);
    Ok(records)
}

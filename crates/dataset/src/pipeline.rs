//! Pipeline Orchestration
//!
//! Runs the preprocessing stages in their required order: static channel
//! extraction, missing-data simulation, mask/delta augmentation, stratified
//! splitting, imputation, standardization. The split assignment, fill profile
//! and channel statistics are computed once during construction and held
//! immutable for the lifetime of the instance; statistics come from the
//! training split only.

use crate::cache::ArrayCache;
use crate::config::{DatasetConfig, Split, Standardise};
use crate::error::DatasetError;
use crate::loader::{Loader, RawData};
use channel_layout::ChannelLayout;
use ndarray::{concatenate, s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use preprocess::{
    fill_profile, fit_channel_stats, fit_static_stats, missing_mask, simulate_missing,
    split_samples, standardize, standardize_static, static_fill_profile, time_delta,
    replace_missing_static, ChannelStats, FillProfile, ForwardImputer, ImputeMethod, Imputer,
    MeanImputer, SplitAssignment, ZeroImputer, EPS,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Tensors for one data split
#[derive(Debug, Clone)]
pub struct SplitData {
    /// Padded time series tensor, shape (samples, steps, channels)
    pub x: Array3<f64>,
    /// Static channel values, one row per sample, if extracted
    pub x_static: Option<Array2<f64>>,
    /// Labels, one row per sample
    pub y: Array2<f64>,
    /// True sequence length of each sample
    pub length: Array1<usize>,
}

impl SplitData {
    fn select(
        x: &Array3<f64>,
        x_static: Option<&Array2<f64>>,
        y: &Array2<f64>,
        length: &Array1<usize>,
        idx: &[usize],
    ) -> Self {
        Self {
            x: x.select(Axis(0), idx),
            x_static: x_static.map(|xs| xs.select(Axis(0), idx)),
            y: y.select(Axis(0), idx),
            length: length.select(Axis(0), idx),
        }
    }

    /// Number of samples in the split
    pub fn len(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    /// Whether the split is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One sample of the selected split
#[derive(Debug)]
pub struct Sample<'a> {
    pub x: ArrayView2<'a, f64>,
    pub x_static: Option<ArrayView1<'a, f64>>,
    pub y: ArrayView1<'a, f64>,
    pub length: usize,
}

/// Preprocessed time series dataset.
///
/// Construction runs the whole pipeline; afterwards the instance is
/// immutable. The `x`/`y`/`length` accessors expose the configured split and
/// every materialized split stays reachable through [`Self::split`].
#[derive(Debug)]
pub struct TimeSeriesDataset {
    dataset: String,
    config: DatasetConfig,
    test_prop: f64,
    layout: ChannelLayout,
    assignment: SplitAssignment,
    fill: Option<FillProfile>,
    static_fill: Option<FillProfile>,
    stats: Option<ChannelStats>,
    static_stats: Option<ChannelStats>,
    train: SplitData,
    val: SplitData,
    test: Option<SplitData>,
}

impl TimeSeriesDataset {
    /// Build a dataset straight from a loader, without caching.
    pub fn new(loader: &dyn Loader, config: DatasetConfig) -> Result<Self, DatasetError> {
        Self::build(loader, config, None, None)
    }

    /// Build a dataset, reading the loader's arrays from the cache when a
    /// valid entry exists and writing one otherwise.
    pub fn with_cache(
        loader: &dyn Loader,
        config: DatasetConfig,
        cache: &ArrayCache,
    ) -> Result<Self, DatasetError> {
        Self::build(loader, config, Some(cache), None)
    }

    /// Build a dataset with a custom imputation strategy in place of the
    /// built-in methods.
    pub fn with_imputer(
        loader: &dyn Loader,
        config: DatasetConfig,
        imputer: Arc<dyn Imputer>,
    ) -> Result<Self, DatasetError> {
        Self::build(loader, config, None, Some(imputer))
    }

    /// Build a dataset with full control over cache and imputation strategy.
    pub fn build(
        loader: &dyn Loader,
        config: DatasetConfig,
        cache: Option<&ArrayCache>,
        custom_imputer: Option<Arc<dyn Imputer>>,
    ) -> Result<Self, DatasetError> {
        // Configuration errors are fatal before any data is touched
        let (val_frac, test_prop) = validate_proportions(&config)?;
        if config.split == Split::Test && test_prop <= EPS {
            return Err(DatasetError::SplitNotAvailable {
                split: config.split,
            });
        }

        let dataset = loader.dataset().to_string();
        let raw = match cache {
            Some(cache) if cache.exists(&dataset) && !config.overwrite_cache => {
                if !cache.validate(&dataset)? {
                    return Err(DatasetError::CacheCorrupted);
                }
                cache.load(&dataset)?
            }
            Some(cache) => {
                info!(dataset = %dataset, "processing raw data");
                let raw = loader.load()?;
                cache.save(&dataset, &raw)?;
                raw
            }
            None => {
                info!(dataset = %dataset, "processing raw data");
                loader.load()?
            }
        };
        raw.validate()?;
        validate_channels(&config, raw.x.len_of(Axis(2)))?;

        let RawData { mut x, y, length } = raw;
        let mut layout = ChannelLayout::new(x.len_of(Axis(2)))?;

        // Split out static channels at sample granularity (step 0)
        let mut x_static = None;
        if !config.static_channels.is_empty() {
            let positions = layout.extract_static(&config.static_channels)?;
            let mut values = Array2::zeros((x.len_of(Axis(0)), positions.len()));
            for (column, &position) in positions.iter().enumerate() {
                values.column_mut(column).assign(&x.slice(s![.., 0, position]));
            }
            let keep: Vec<usize> = (0..x.len_of(Axis(2)))
                .filter(|i| !positions.contains(i))
                .collect();
            x = x.select(Axis(2), &keep);
            x_static = Some(values);
            debug!(channels = positions.len(), "extracted static channels");
        }

        // Simulate missing data on the data channels only
        if config.missing.is_active() {
            let mut rng = seeded_rng(config.seed);
            simulate_missing(&mut x, layout.data_idx(), &config.missing, &mut rng)?;
        }

        // Mask and delta are derived before imputation so they reflect true
        // and simulated missingness; the time channel is dropped only after
        // delta has used it
        if config.mask {
            let mask = missing_mask(&x, layout.data_idx());
            layout.append_mask()?;
            x = concatenate(Axis(2), &[x.view(), mask.view()])?;
        }
        if config.delta {
            let delta = time_delta(&x, layout.time_idx()[0], layout.data_idx());
            layout.append_delta()?;
            x = concatenate(Axis(2), &[x.view(), delta.view()])?;
        }
        if !config.time {
            let keep: Vec<usize> = (1..x.len_of(Axis(2))).collect();
            x = x.select(Axis(2), &keep);
            layout.drop_time()?;
        }

        // Stratify on whether a sample has any positive label value
        let stratify: Vec<bool> = y
            .axis_iter(Axis(0))
            .map(|row| row.iter().filter(|v| !v.is_nan()).sum::<f64>() > 0.0)
            .collect();
        let mut rng = seeded_rng(config.seed);
        let assignment = split_samples(&stratify, val_frac, test_prop, &mut rng)?;

        let mut train = SplitData::select(&x, x_static.as_ref(), &y, &length, &assignment.train);
        let mut val = SplitData::select(&x, x_static.as_ref(), &y, &length, &assignment.val);
        let mut test = assignment
            .test
            .as_ref()
            .map(|idx| SplitData::select(&x, x_static.as_ref(), &y, &length, idx));

        // Impute missing data with training-split fill values
        let imputer: Option<&dyn Imputer> = match (&custom_imputer, config.impute) {
            (Some(custom), _) => Some(custom.as_ref()),
            (None, ImputeMethod::Zero) => Some(&ZeroImputer),
            (None, ImputeMethod::Mean) => Some(&MeanImputer),
            (None, ImputeMethod::Forward) => Some(&ForwardImputer),
            (None, ImputeMethod::None) => None,
        };
        let mut fill = None;
        let mut static_fill = None;
        if let Some(imputer) = imputer {
            let profile = fill_profile(
                &train.x,
                layout.data_idx(),
                layout.source_channels(),
                &config.categorical,
                &config.channel_means,
            );
            let select = layout.data_idx().to_vec();
            imputer.apply(&mut train.x, &mut train.y, profile.values(), &select)?;
            imputer.apply(&mut val.x, &mut val.y, profile.values(), &select)?;
            if let Some(test) = test.as_mut() {
                imputer.apply(&mut test.x, &mut test.y, profile.values(), &select)?;
            }
            fill = Some(profile);

            if let Some(xs_train) = train.x_static.as_ref() {
                let profile = static_fill_profile(
                    xs_train,
                    &config.static_channels,
                    &config.categorical,
                    &config.channel_means,
                );
                let values = if custom_imputer.is_none() && config.impute == ImputeMethod::Zero {
                    vec![0.0; profile.values().len()]
                } else {
                    profile.values().to_vec()
                };
                for split in [&mut train, &mut val].into_iter().chain(test.as_mut()) {
                    if let Some(xs) = split.x_static.as_mut() {
                        replace_missing_static(xs, &values)?;
                    }
                }
                static_fill = Some(profile);
            }
        }

        // Standardize with training-split statistics
        let mut stats = None;
        let mut static_stats = None;
        if config.standardise != Standardise::None {
            let mut continuous: Vec<usize> = match config.standardise {
                Standardise::All => layout
                    .time_idx()
                    .iter()
                    .chain(layout.data_idx())
                    .chain(layout.delta_idx())
                    .copied()
                    .collect(),
                _ => layout.data_idx().to_vec(),
            };
            let categorical_positions: Vec<usize> = config
                .categorical
                .iter()
                .filter_map(|&channel| layout.position_of(channel).ok())
                .collect();
            continuous.retain(|position| !categorical_positions.contains(position));

            let channel_stats = fit_channel_stats(&train.x, &continuous);
            standardize(&mut train.x, &channel_stats);
            standardize(&mut val.x, &channel_stats);
            if let Some(test) = test.as_mut() {
                standardize(&mut test.x, &channel_stats);
            }
            stats = Some(channel_stats);

            if let Some(xs_train) = train.x_static.as_ref() {
                let columns: Vec<usize> = config
                    .static_channels
                    .iter()
                    .enumerate()
                    .filter(|(_, channel)| !config.categorical.contains(channel))
                    .map(|(column, _)| column)
                    .collect();
                let fitted = fit_static_stats(xs_train, &columns);
                for split in [&mut train, &mut val].into_iter().chain(test.as_mut()) {
                    if let Some(xs) = split.x_static.as_mut() {
                        standardize_static(xs, &fitted);
                    }
                }
                static_stats = Some(fitted);
            }
        }

        layout.validate()?;
        debug!(
            dataset = %dataset,
            channels = layout.total_channels(),
            train = train.len(),
            val = val.len(),
            test = test.as_ref().map_or(0, SplitData::len),
            "dataset ready"
        );
        Ok(Self {
            dataset,
            config,
            test_prop,
            layout,
            assignment,
            fill,
            static_fill,
            stats,
            static_stats,
            train,
            val,
            test,
        })
    }

    /// Tensors for the given split.
    pub fn split(&self, split: Split) -> Result<&SplitData, DatasetError> {
        match split {
            Split::Train => Ok(&self.train),
            Split::Val => Ok(&self.val),
            Split::Test => self
                .test
                .as_ref()
                .ok_or(DatasetError::SplitNotAvailable { split }),
        }
    }

    /// Tensors for the configured split.
    pub fn selected(&self) -> &SplitData {
        match self.config.split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            // Availability was checked during construction
            Split::Test => self.test.as_ref().unwrap_or(&self.val),
        }
    }

    /// Padded tensor of the configured split
    pub fn x(&self) -> &Array3<f64> {
        &self.selected().x
    }

    /// Static channel values of the configured split, if extracted
    pub fn x_static(&self) -> Option<&Array2<f64>> {
        self.selected().x_static.as_ref()
    }

    /// Labels of the configured split
    pub fn y(&self) -> &Array2<f64> {
        &self.selected().y
    }

    /// True sequence lengths of the configured split
    pub fn length(&self) -> &Array1<usize> {
        &self.selected().length
    }

    /// Number of samples in the configured split
    pub fn len(&self) -> usize {
        self.selected().len()
    }

    /// Whether the configured split is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One sample of the configured split
    pub fn get(&self, index: usize) -> Option<Sample<'_>> {
        let split = self.selected();
        if index >= split.len() {
            return None;
        }
        Some(Sample {
            x: split.x.index_axis(Axis(0), index),
            x_static: split
                .x_static
                .as_ref()
                .map(|xs| xs.index_axis(Axis(0), index)),
            y: split.y.index_axis(Axis(0), index),
            length: split.length[index],
        })
    }

    /// Time channel indices (empty or one entry)
    pub fn time_idx(&self) -> &[usize] {
        self.layout.time_idx()
    }

    /// Data channel indices
    pub fn data_idx(&self) -> &[usize] {
        self.layout.data_idx()
    }

    /// Mask channel indices
    pub fn mask_idx(&self) -> &[usize] {
        self.layout.mask_idx()
    }

    /// Delta channel indices
    pub fn delta_idx(&self) -> &[usize] {
        self.layout.delta_idx()
    }

    /// Number of time series data channels
    pub fn n_channels(&self) -> usize {
        self.layout.n_data()
    }

    /// Number of static channels
    pub fn n_channels_static(&self) -> usize {
        self.config.static_channels.len()
    }

    /// Channel layout of the output tensor
    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Sample index partition behind the splits
    pub fn split_assignment(&self) -> &SplitAssignment {
        &self.assignment
    }

    /// Training-split fill values, if imputation ran
    pub fn fill_profile(&self) -> Option<&FillProfile> {
        self.fill.as_ref()
    }

    /// Training-split fill values for static channels, if imputation ran
    pub fn static_fill_profile(&self) -> Option<&FillProfile> {
        self.static_fill.as_ref()
    }

    /// Training-split standardization statistics, if standardization ran
    pub fn channel_stats(&self) -> Option<&ChannelStats> {
        self.stats.as_ref()
    }

    /// Training-split statistics for static channels, if standardization ran
    pub fn static_channel_stats(&self) -> Option<&ChannelStats> {
        self.static_stats.as_ref()
    }
}

impl fmt::Display for TimeSeriesDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_prop = self
            .config
            .val_prop
            .unwrap_or(1.0 - self.config.train_prop);
        write!(
            f,
            "TimeSeriesDataset: {}\n \
             - data split = {:.0}/{:.0}/{:.0}% (training/validation/test)\n \
             - time/mask/delta channels = {}/{}/{}\n \
             - random seed = {:?}\n \
             - static channels = {:?}\n \
             - categorical channels = {:?}\n \
             - standardise = {:?}\n \
             - X, y, length attributes return the {} split",
            self.dataset,
            100.0 * self.config.train_prop,
            100.0 * val_prop,
            100.0 * self.test_prop,
            self.config.time,
            self.config.mask,
            self.config.delta,
            self.config.seed,
            self.config.static_channels,
            self.config.categorical,
            self.config.standardise,
            self.config.split,
        )
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn validate_proportions(config: &DatasetConfig) -> Result<(f64, f64), DatasetError> {
    if !(config.train_prop > EPS && config.train_prop < 1.0) {
        return Err(DatasetError::InvalidTrainProp {
            value: config.train_prop,
        });
    }
    match config.val_prop {
        None => Ok((1.0 - config.train_prop, 0.0)),
        Some(val_prop) => {
            let max = 1.0 - config.train_prop;
            if !(val_prop > EPS && val_prop < max) {
                return Err(DatasetError::InvalidValProp {
                    value: val_prop,
                    max,
                });
            }
            let test_prop = 1.0 - config.train_prop - val_prop;
            // Validation fraction of the non-test remainder
            Ok((val_prop / (1.0 - test_prop), test_prop))
        }
    }
}

fn validate_channels(config: &DatasetConfig, total: usize) -> Result<(), DatasetError> {
    let checks: [(&'static str, Box<dyn Iterator<Item = usize> + '_>); 3] = [
        ("static", Box::new(config.static_channels.iter().copied())),
        ("categorical", Box::new(config.categorical.iter().copied())),
        (
            "channel_means",
            Box::new(config.channel_means.keys().copied()),
        ),
    ];
    for (argument, channels) in checks {
        for channel in channels {
            if channel == 0 || channel >= total {
                return Err(DatasetError::UnknownChannel { argument, channel });
            }
        }
    }
    Ok(())
}

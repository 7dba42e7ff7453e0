use super::check_output_path;
use crate::action::Action;
use crate::error::{FilterError, FilterResult};
use crate::filter::{Completion, Filter};
use crate::message::{Message, MessageHandler, ProgressReporter};
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use parking_lot::Mutex;
use std::ops::Range;
use tessera_concurrency::ParallelDataAlgorithm;
use tessera_core::{
    dispatch_data_type, Arguments, CancelFlag, DataObjectType, DataPath, DataType, Result, Scalar,
};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Code for a feature id array that is not single-component `int32`
pub const BAD_FEATURE_IDS: i32 = -5701;
/// Code for an input array whose tuple count differs from the feature ids
pub const TUPLE_COUNT_MISMATCH: i32 = -5702;
/// Code for an input array with more than one component
pub const MULTI_COMPONENT_INPUT: i32 = -5703;
/// Code for a feature id outside `0..number_of_features`
pub const FEATURE_ID_OUT_OF_RANGE: i32 = -5704;
/// Code for minimum and mean outputs sharing one name
pub const DUPLICATE_OUTPUT_NAME: i32 = -5705;

/// Tuples between two cancel checks inside a chunk
const CANCEL_STRIDE: usize = 4096;

/// Per-feature minimum and mean of a cell array
///
/// Every tuple belongs to the feature named by the matching entry of the
/// feature id array. Feature 0 is the background: its tuples are ignored and
/// its row of the outputs stays 0, as does the row of a feature without any
/// tuple. Outputs are `float64` arrays in a new attribute matrix with one
/// tuple per feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindFeatureStatisticsFilter;

struct Outputs {
    feature_data: DataPath,
    minimum: DataPath,
    mean: DataPath,
}

fn outputs(args: &Arguments) -> Result<Outputs> {
    let feature_data = args.get_path("feature_data_path")?;
    Ok(Outputs {
        minimum: feature_data.create_child_path(args.get_string("minimum_name")?)?,
        mean: feature_data.create_child_path(args.get_string("mean_name")?)?,
        feature_data,
    })
}

/// Running minimum, sum and count per feature over some tuples
#[derive(Debug, Clone, PartialEq)]
struct Partial {
    min: Vec<f64>,
    sum: Vec<f64>,
    count: Vec<usize>,
}

impl Partial {
    fn new(features: usize) -> Self {
        Self {
            min: vec![f64::INFINITY; features],
            sum: vec![0.0; features],
            count: vec![0; features],
        }
    }

    fn merge(&mut self, other: &Partial) {
        for f in 0..self.count.len() {
            self.min[f] = self.min[f].min(other.min[f]);
            self.sum[f] += other.sum[f];
            self.count[f] += other.count[f];
        }
    }

    /// Features other than the background with at least one tuple
    fn populated(&self) -> usize {
        self.count.iter().skip(1).filter(|c| **c > 0).count()
    }
}

/// Accumulate the tuples in `range`, background excluded
///
/// Returns `None` if cancelled. Fails on the first id outside `0..features`.
fn accumulate(
    feature_ids: &[i32],
    values: &[f64],
    range: Range<usize>,
    features: usize,
    cancel: &CancelFlag,
) -> FilterResult<Option<Partial>> {
    let mut partial = Partial::new(features);
    for tuple in range {
        if tuple % CANCEL_STRIDE == 0 && cancel.is_cancelled() {
            return Ok(None);
        }
        let id = feature_ids[tuple];
        let feature = usize::try_from(id)
            .ok()
            .filter(|f| *f < features)
            .ok_or_else(|| {
                FilterError::execution(
                    FEATURE_ID_OUT_OF_RANGE,
                    format!("tuple {} has feature id {} outside 0..{}", tuple, id, features),
                )
            })?;
        if feature != 0 {
            let v = values[tuple];
            partial.min[feature] = partial.min[feature].min(v);
            partial.sum[feature] += v;
            partial.count[feature] += 1;
        }
    }
    Ok(Some(partial))
}

impl FindFeatureStatisticsFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let ids_path = args.get_path("feature_ids_path")?;
        let input_path = args.get_path("input_path")?;
        let features = args.get_usize("number_of_features")?;
        let out = outputs(args)?;
        if out.minimum == out.mean {
            return Ok(ValidationResult::error(
                DUPLICATE_OUTPUT_NAME,
                format!("minimum and mean are both written to {}", out.mean),
            ));
        }

        let ids = ds.get_data_array(&ids_path)?;
        let input = ds.get_data_array(&input_path)?;
        let mut result = ValidationResult::ok();
        if ids.data_type() != DataType::Int32 || ids.number_of_components() != 1 {
            result.push_error(
                BAD_FEATURE_IDS,
                format!(
                    "{} must be a single-component int32 array, found {} x{}",
                    ids_path,
                    ids.data_type(),
                    ids.number_of_components()
                ),
            );
        }
        if input.number_of_components() != 1 {
            result.push_error(
                MULTI_COMPONENT_INPUT,
                format!("{} has {} components, expected 1", input_path, input.number_of_components()),
            );
        }
        if input.number_of_tuples() != ids.number_of_tuples() {
            result.push_error(
                TUPLE_COUNT_MISMATCH,
                format!(
                    "{} has {} tuples but {} has {}",
                    input_path,
                    input.number_of_tuples(),
                    ids_path,
                    ids.number_of_tuples()
                ),
            );
        }
        if let Some(diagnostic) = check_output_path(ds, &out.feature_data) {
            result.errors.push(diagnostic);
        }
        if !result.is_valid() {
            return Ok(result);
        }

        result.push_action(Action::CreateAttributeMatrix {
            path: out.feature_data,
            tuple_shape: vec![features],
        });
        for path in [out.minimum, out.mean] {
            result.push_action(Action::CreateArray {
                data_type: DataType::Float64,
                tuple_shape: vec![features],
                component_shape: vec![1],
                path,
                fill_value: None,
            });
        }
        Ok(result)
    }
}

impl Filter for FindFeatureStatisticsFilter {
    fn name(&self) -> &'static str {
        "find_feature_statistics"
    }

    fn class_name(&self) -> &'static str {
        "FindFeatureStatisticsFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0x3a0f0d5e_5a2c_4e08_b1d7_9a3c4f0e6b21)
    }

    fn human_name(&self) -> &'static str {
        "Find Feature Statistics"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Statistics", "Feature", "Minimum", "Mean"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "feature_ids_path",
                "Feature Ids",
                "Single-component int32 array naming the feature of each tuple",
                ParameterKind::ExistingPath {
                    allowed: vec![DataObjectType::DataArray],
                },
                DataPath::root(),
            ))
            .with(Parameter::new(
                "input_path",
                "Input Array",
                "Single-component array to summarize",
                ParameterKind::ExistingPath {
                    allowed: vec![DataObjectType::DataArray],
                },
                DataPath::root(),
            ))
            .with(Parameter::new(
                "number_of_features",
                "Number of Features",
                "Feature ids run from 0 (background) to this value minus one",
                ParameterKind::Integer {
                    min: Some(1),
                    max: None,
                },
                1i64,
            ))
            .with(Parameter::new(
                "feature_data_path",
                "Feature Attribute Matrix",
                "Created with one tuple per feature",
                ParameterKind::CreatedPath,
                "Feature Data",
            ))
            .with(Parameter::new(
                "minimum_name",
                "Minimum Array Name",
                "",
                ParameterKind::String,
                "Minimum",
            ))
            .with(Parameter::new(
                "mean_name",
                "Mean Array Name",
                "",
                ParameterKind::String,
                "Mean",
            ))
    }

    fn clone_filter(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }

    fn validate(&self, ds: &DataStructure, args: &Arguments, _cancel: &CancelFlag) -> ValidationResult {
        self.plan(ds, args).unwrap_or_else(ValidationResult::from)
    }

    fn execute(
        &self,
        ds: &mut DataStructure,
        args: &Arguments,
        messages: &dyn MessageHandler,
        cancel: &CancelFlag,
    ) -> FilterResult<Completion> {
        let ids_path = args.get_path("feature_ids_path")?;
        let input_path = args.get_path("input_path")?;
        let features = args.get_usize("number_of_features")?;
        let out = outputs(args)?;

        let feature_ids = ds.get_array::<i32>(&ids_path)?.as_slice();
        let input = ds.get_data_array(&input_path)?;
        let values: Vec<f64> = dispatch_data_type!(input.data_type(), T => {
            ds.get_array::<T>(&input_path)?
                .as_slice()
                .iter()
                .map(|v| v.to_f64())
                .collect()
        });
        let tuples = feature_ids.len().min(values.len());

        // Chunks finish in any order; merging by chunk start keeps the sums
        // and the reported failure independent of scheduling
        let progress = ProgressReporter::for_handler(messages, "Finding feature statistics", tuples);
        let partials = Mutex::new(Vec::new());
        let outcome = ParallelDataAlgorithm::new(0..tuples).execute(
            |range, cancel| {
                let len = range.len();
                let start = range.start;
                match accumulate(feature_ids, &values, range, features, cancel) {
                    Ok(None) => {}
                    Ok(Some(partial)) => partials.lock().push((start, Ok(partial))),
                    Err(e) => partials.lock().push((start, Err(e))),
                }
                progress.advance(len);
            },
            cancel,
        );
        messages.handle(Message::debug(format!(
            "{} tuples in {} chunks",
            tuples,
            outcome.chunks_started()
        )));
        if outcome.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        progress.finish();

        let mut partials = partials.into_inner();
        partials.sort_by_key(|(start, _)| *start);
        let mut total = Partial::new(features);
        for (_, partial) in partials {
            total.merge(&partial?);
        }

        let minimum = ds.get_array_mut::<f64>(&out.minimum)?.as_mut_slice();
        for (f, dst) in minimum.iter_mut().enumerate().skip(1) {
            if total.count[f] > 0 {
                *dst = total.min[f];
            }
        }
        let mean = ds.get_array_mut::<f64>(&out.mean)?.as_mut_slice();
        for (f, dst) in mean.iter_mut().enumerate().skip(1) {
            if total.count[f] > 0 {
                *dst = total.sum[f] / total.count[f] as f64;
            }
        }
        messages.handle(Message::info(format!(
            "{} of {} features have tuples",
            total.populated(),
            features.saturating_sub(1)
        )));
        Ok(Completion::Completed)
    }
}

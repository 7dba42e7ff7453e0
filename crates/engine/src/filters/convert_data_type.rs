use super::check_output_path;
use crate::action::{Action, DeleteMode};
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_concurrency::{DispatchOutcome, ParallelDataAlgorithm};
use tessera_core::{
    dispatch_data_type, Arguments, CancelFlag, DataObjectType, DataPath, DataType, Error, Result,
    Scalar,
};
use tessera_storage::{DataStore, DataStructure};
use uuid::Uuid;

/// Warning code when the output kind equals the input kind
pub const SAME_DATA_TYPE: i32 = -5601;

/// Copy an array into a sibling array of another element kind
///
/// Values are converted through `f64` with saturating casts. With
/// `delete_original` the input is erased after a successful run and the
/// output takes over its name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertDataTypeFilter;

fn output_path(args: &Arguments) -> Result<(DataPath, DataPath)> {
    let input = args.get_path("input_path")?;
    let output = input.replace_name(args.get_string("output_name")?)?;
    Ok((input, output))
}

fn convert_into<I, O>(source: &[I], out: &mut DataStore<O>, cancel: &CancelFlag) -> Result<DispatchOutcome>
where
    I: Scalar,
    O: Scalar,
{
    if source.len() != out.len() {
        return Err(Error::ShapeMismatch {
            expected: vec![out.len()],
            actual: vec![source.len()],
        });
    }
    let components = out.number_of_components();
    let tuples = out.number_of_tuples();
    ParallelDataAlgorithm::new(0..tuples).execute_mut(
        out.as_mut_slice(),
        components,
        |range, chunk, cancel| {
            if cancel.is_cancelled() {
                return;
            }
            let start = range.start * components;
            let len = chunk.len();
            for (dst, src) in chunk.iter_mut().zip(&source[start..start + len]) {
                *dst = O::from_f64(src.to_f64());
            }
        },
        cancel,
    )
}

impl ConvertDataTypeFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let (input, output) = output_path(args)?;
        let output_type = args.get_data_type("output_type")?;
        let delete_original = args.get_bool("delete_original")?;
        let store = ds.get_data_array(&input)?;

        if let Some(diagnostic) = check_output_path(ds, &output) {
            return Ok(ValidationResult {
                errors: vec![diagnostic],
                ..ValidationResult::ok()
            });
        }

        let mut result = ValidationResult::ok();
        if store.data_type() == output_type {
            result.push_warning(
                SAME_DATA_TYPE,
                format!("{} already holds {} values", input, output_type),
            );
        }
        result.push_action(Action::CreateArray {
            data_type: output_type,
            tuple_shape: store.tuple_shape().to_vec(),
            component_shape: store.component_shape().to_vec(),
            path: output.clone(),
            fill_value: None,
        });
        if delete_original {
            if let Some(name) = input.target_name() {
                result.push_deferred(Action::Delete {
                    path: input.clone(),
                    mode: DeleteMode::JustObject,
                });
                result.push_deferred(Action::Rename {
                    path: output,
                    new_name: name.to_string(),
                });
            }
        }
        Ok(result)
    }
}

impl Filter for ConvertDataTypeFilter {
    fn name(&self) -> &'static str {
        "convert_data_type"
    }

    fn class_name(&self) -> &'static str {
        "ConvertDataTypeFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0x6dc586cc_59fb_4ee8_90ff_2d3587da12f5)
    }

    fn human_name(&self) -> &'static str {
        "Convert Data Type"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Convert", "Cast", "Array"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "input_path",
                "Array to Convert",
                "",
                ParameterKind::ExistingPath {
                    allowed: vec![DataObjectType::DataArray],
                },
                DataPath::root(),
            ))
            .with(Parameter::new(
                "output_type",
                "Scalar Type",
                "Element kind of the converted array",
                ParameterKind::DataType,
                DataType::Float32,
            ))
            .with(Parameter::new(
                "output_name",
                "Converted Array",
                "Name of the new sibling array",
                ParameterKind::String,
                "Converted",
            ))
            .with(Parameter::new(
                "delete_original",
                "Delete Original Array",
                "Replace the input by the converted array",
                ParameterKind::Bool,
                false,
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
        _messages: &dyn MessageHandler,
        cancel: &CancelFlag,
    ) -> FilterResult<Completion> {
        let (input, output) = output_path(args)?;
        let output_type = args.get_data_type("output_type")?;

        let outcome = dispatch_data_type!(output_type, O => {
            ds.split_array_mut::<O, _>(&output, |ds, out| -> Result<DispatchOutcome> {
                let source = ds.get_data_array(&input)?;
                dispatch_data_type!(source.data_type(), I => {
                    convert_into(ds.get_array::<I>(&input)?.as_slice(), out, cancel)
                })
            })
        })??;

        Ok(match outcome {
            DispatchOutcome::Completed { .. } => Completion::Completed,
            DispatchOutcome::Cancelled { .. } => Completion::Cancelled,
        })
    }
}

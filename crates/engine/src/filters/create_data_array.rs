use super::{check_output_path, is_valid_shape, INVALID_SHAPE};
use crate::action::Action;
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_core::{dispatch_data_type, Arguments, CancelFlag, DataType, Result, Scalar};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Warning code when the tuple shape is taken from the parent attribute matrix
pub const TUPLE_SHAPE_FROM_PARENT: i32 = -5101;

/// Create an array filled with a constant
///
/// Under an attribute matrix the array takes the matrix's tuple shape and the
/// `tuple_shape` argument is ignored with a warning if it differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDataArrayFilter;

impl CreateDataArrayFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let data_type = args.get_data_type("data_type")?;
        let mut tuple_shape = args.get_shape("tuple_shape")?;
        let component_shape = args.get_shape("component_shape")?;
        let fill_value = args.get_string("fill_value")?;
        let path = args.get_path("output_path")?;

        if let Some(diagnostic) = check_output_path(ds, &path) {
            return Ok(ValidationResult {
                errors: vec![diagnostic],
                ..ValidationResult::ok()
            });
        }
        if !is_valid_shape(&component_shape) {
            return Ok(ValidationResult::error(
                INVALID_SHAPE,
                format!("component shape {:?} has a zero extent", component_shape),
            ));
        }
        dispatch_data_type!(data_type, T => T::parse_value(fill_value).map(|_| ()))?;

        let mut result = ValidationResult::ok();
        if let Ok(required) = ds.get_attribute_matrix_shape(&path.get_parent()) {
            if required != tuple_shape.as_slice() {
                result.push_warning(
                    TUPLE_SHAPE_FROM_PARENT,
                    format!(
                        "tuple shape {:?} replaced by {:?} from {}",
                        tuple_shape,
                        required,
                        path.get_parent()
                    ),
                );
                tuple_shape = required.to_vec();
            }
        } else if !is_valid_shape(&tuple_shape) {
            return Ok(ValidationResult::error(
                INVALID_SHAPE,
                format!("tuple shape {:?} has a zero extent", tuple_shape),
            ));
        }

        result.push_action(Action::CreateArray {
            data_type,
            tuple_shape,
            component_shape,
            path,
            fill_value: Some(fill_value.to_string()),
        });
        Ok(result)
    }
}

impl Filter for CreateDataArrayFilter {
    fn name(&self) -> &'static str {
        "create_data_array"
    }

    fn class_name(&self) -> &'static str {
        "CreateDataArrayFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0x67041f9b_bdc6_4122_acc6_c9fe9280e90d)
    }

    fn human_name(&self) -> &'static str {
        "Create Data Array"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Create", "Array", "Initialize"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "data_type",
                "Data Type",
                "Element kind of the new array",
                ParameterKind::DataType,
                DataType::Float32,
            ))
            .with(Parameter::new(
                "tuple_shape",
                "Tuple Shape",
                "Ignored under an attribute matrix",
                ParameterKind::Shape,
                vec![1usize],
            ))
            .with(Parameter::new(
                "component_shape",
                "Component Shape",
                "Shape of one tuple",
                ParameterKind::Shape,
                vec![1usize],
            ))
            .with(Parameter::new(
                "fill_value",
                "Initialization Value",
                "Value written to every element",
                ParameterKind::String,
                "0",
            ))
            .with(Parameter::new(
                "output_path",
                "Created Array",
                "Path of the new array",
                ParameterKind::CreatedPath,
                "Data",
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
        _ds: &mut DataStructure,
        _args: &Arguments,
        _messages: &dyn MessageHandler,
        _cancel: &CancelFlag,
    ) -> FilterResult<Completion> {
        // The create action already allocated and filled the array
        Ok(Completion::Completed)
    }
}

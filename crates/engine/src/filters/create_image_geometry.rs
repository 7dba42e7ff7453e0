use super::{check_output_path, is_valid_shape, INVALID_SHAPE};
use crate::action::Action;
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_core::{Arguments, CancelFlag, Result};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Code for a non-positive or non-finite cell spacing
pub const INVALID_SPACING: i32 = -5201;

/// Create an image geometry and its cell attribute matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateImageGeometryFilter;

fn triple(values: &[f64]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value as f32;
    }
    out
}

impl CreateImageGeometryFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let path = args.get_path("geometry_path")?;
        let dims = args.get_shape("dimensions")?;
        let origin = args.get_float_vec("origin")?;
        let spacing = args.get_float_vec("spacing")?;
        let cell_data_name = args.get_string("cell_data_name")?;

        if let Some(diagnostic) = check_output_path(ds, &path) {
            return Ok(ValidationResult {
                errors: vec![diagnostic],
                ..ValidationResult::ok()
            });
        }
        if dims.len() != 3 || !is_valid_shape(&dims) {
            return Ok(ValidationResult::error(
                INVALID_SHAPE,
                format!("dimensions {:?} must be three positive extents", dims),
            ));
        }
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Ok(ValidationResult::error(
                INVALID_SPACING,
                format!("spacing {:?} must be positive", spacing),
            ));
        }

        let mut result = ValidationResult::ok();
        result.push_action(Action::CreateImageGeometry {
            path,
            dims: [dims[0], dims[1], dims[2]],
            origin: triple(&origin),
            spacing: triple(&spacing),
            cell_data_name: Some(cell_data_name.to_string()).filter(|name| !name.is_empty()),
        });
        Ok(result)
    }
}

impl Filter for CreateImageGeometryFilter {
    fn name(&self) -> &'static str {
        "create_image_geometry"
    }

    fn class_name(&self) -> &'static str {
        "CreateImageGeometryFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0xc4320659_1a84_461d_939e_c7c10229a504)
    }

    fn human_name(&self) -> &'static str {
        "Create Geometry (Image)"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Create", "Geometry", "Image"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "geometry_path",
                "Geometry Name",
                "Path of the new geometry",
                ParameterKind::CreatedPath,
                "Image Geometry",
            ))
            .with(Parameter::new(
                "dimensions",
                "Dimensions",
                "Cells along x, y and z",
                ParameterKind::Shape,
                vec![1usize, 1, 1],
            ))
            .with(Parameter::new(
                "origin",
                "Origin",
                "Position of the first cell corner",
                ParameterKind::FloatVector { len: 3 },
                vec![0.0, 0.0, 0.0],
            ))
            .with(Parameter::new(
                "spacing",
                "Spacing",
                "Cell size along x, y and z",
                ParameterKind::FloatVector { len: 3 },
                vec![1.0, 1.0, 1.0],
            ))
            .with(Parameter::new(
                "cell_data_name",
                "Cell Data Name",
                "Attribute matrix for per-cell arrays; empty for none",
                ParameterKind::String,
                "Cell Data",
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
        Ok(Completion::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::run_filter;
    use crate::message::NullMessageHandler;
    use tessera_core::DataPath;

    fn args() -> Arguments {
        CreateImageGeometryFilter
            .parameters()
            .default_arguments()
            .with("dimensions", vec![10usize, 20, 5])
            .with("spacing", vec![0.5, 0.5, 2.0])
    }

    #[test]
    fn test_creates_geometry_with_cells() {
        let mut ds = DataStructure::new();
        let report = run_filter(
            &CreateImageGeometryFilter,
            &mut ds,
            &args(),
            &NullMessageHandler,
            &CancelFlag::new(),
        );
        assert!(report.is_completed(), "{:?}", report.validation);

        let geometry_path: DataPath = "Image Geometry".parse().unwrap();
        let image = ds.get_geometry(&geometry_path).unwrap().as_image().unwrap();
        assert_eq!(image.dims, [10, 20, 5]);
        assert_eq!(image.spacing, [0.5, 0.5, 2.0]);
        let cells = geometry_path.create_child_path("Cell Data").unwrap();
        assert_eq!(ds.get_attribute_matrix_shape(&cells).unwrap(), &[5, 20, 10]);
    }

    #[test]
    fn test_empty_cell_name_skips_matrix() {
        let ds = DataStructure::new();
        let result = CreateImageGeometryFilter.preflight(
            &ds,
            &args().with("cell_data_name", ""),
            &CancelFlag::new(),
        );
        assert!(result.is_valid());
        assert_eq!(result.actions.actions[0].created_paths().len(), 1);
    }

    #[test]
    fn test_rejects_bad_dimensions_and_spacing() {
        let ds = DataStructure::new();
        let cancel = CancelFlag::new();
        let result = CreateImageGeometryFilter.preflight(&ds, &args().with("dimensions", vec![4usize, 0, 1]), &cancel);
        assert_eq!(result.errors[0].code, INVALID_SHAPE);
        let result = CreateImageGeometryFilter.preflight(&ds, &args().with("spacing", vec![1.0, -1.0, 1.0]), &cancel);
        assert_eq!(result.errors[0].code, INVALID_SPACING);
    }
}

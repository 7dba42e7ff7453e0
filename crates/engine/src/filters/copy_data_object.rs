use super::check_output_path;
use crate::action::Action;
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_core::{Arguments, CancelFlag, DataPath, Result};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Code for a copy placed inside its own source
pub const COPY_INTO_SELF: i32 = -5301;

/// Deep copy an object and everything below it
///
/// The copy gets fresh ids and its own buffers; changing one side later
/// never shows through on the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyDataObjectFilter;

impl CopyDataObjectFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let source = args.get_path("source_path")?;
        let dest = args.get_path("destination_path")?;

        if let Some(diagnostic) = check_output_path(ds, &dest) {
            return Ok(ValidationResult {
                errors: vec![diagnostic],
                ..ValidationResult::ok()
            });
        }
        if source.is_ancestor_of(&dest) {
            return Ok(ValidationResult::error(
                COPY_INTO_SELF,
                format!("cannot copy {} into itself at {}", source, dest),
            ));
        }

        let mut result = ValidationResult::ok();
        result.push_action(Action::Copy { source, dest });
        Ok(result)
    }
}

impl Filter for CopyDataObjectFilter {
    fn name(&self) -> &'static str {
        "copy_data_object"
    }

    fn class_name(&self) -> &'static str {
        "CopyDataObjectFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0xac8d51d8_6961_4a7a_a2a8_cd5e5e5c9f2e)
    }

    fn human_name(&self) -> &'static str {
        "Copy Data Object"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Copy", "Duplicate", "Memory Management"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "source_path",
                "Object to Copy",
                "Root of the subgraph to copy",
                ParameterKind::ExistingPath { allowed: Vec::new() },
                DataPath::root(),
            ))
            .with(Parameter::new(
                "destination_path",
                "Copy Path",
                "Path of the copy; its last segment names it",
                ParameterKind::CreatedPath,
                "Copy",
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
    use tessera_core::DataType;

    fn path(s: &str) -> DataPath {
        s.parse().unwrap()
    }

    fn graph() -> DataStructure {
        let mut ds = DataStructure::new();
        ds.create_group("Source", &DataPath::root()).unwrap();
        ds.create_data_array(&path("Source"), "Values", DataType::Float64, vec![4], vec![1])
            .unwrap();
        ds
    }

    #[test]
    fn test_copy_is_independent() {
        let mut ds = graph();
        let args = Arguments::new()
            .with("source_path", "Source")
            .with("destination_path", "Backup");
        let report = run_filter(&CopyDataObjectFilter, &mut ds, &args, &NullMessageHandler, &CancelFlag::new());
        assert!(report.is_completed());

        ds.get_array_mut::<f64>(&path("Source/Values"))
            .unwrap()
            .fill(9.0);
        let copy = ds.get_array::<f64>(&path("Backup/Values")).unwrap();
        assert!(copy.as_slice().iter().all(|v| *v == 0.0));
        assert_ne!(
            ds.resolve(&path("Source/Values")).unwrap(),
            ds.resolve(&path("Backup/Values")).unwrap()
        );
    }

    #[test]
    fn test_copy_into_own_subtree_rejected() {
        let ds = graph();
        let args = Arguments::new()
            .with("source_path", "Source")
            .with("destination_path", "Source/Inner");
        let result = CopyDataObjectFilter.preflight(&ds, &args, &CancelFlag::new());
        assert_eq!(result.errors[0].code, COPY_INTO_SELF);
    }

    #[test]
    fn test_missing_source_fails_schema() {
        let ds = graph();
        let args = Arguments::new()
            .with("source_path", "Nope")
            .with("destination_path", "Backup");
        let result = CopyDataObjectFilter.preflight(&ds, &args, &CancelFlag::new());
        assert!(!result.is_valid());
        assert!(result.actions.is_empty());
    }
}

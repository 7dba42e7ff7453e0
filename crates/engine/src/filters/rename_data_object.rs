use super::OUTPUT_EXISTS;
use crate::action::Action;
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_core::{Arguments, CancelFlag, DataPath, Result};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Warning code when the new name equals the old one
pub const NAME_UNCHANGED: i32 = -5401;

/// Rename an object in every container that links it
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameDataObjectFilter;

impl RenameDataObjectFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let path = args.get_path("source_path")?;
        let new_name = args.get_string("new_name")?;
        let renamed = path.replace_name(new_name)?;

        let mut result = ValidationResult::ok();
        if renamed == path {
            result.push_warning(NAME_UNCHANGED, format!("{} already has that name", path));
            return Ok(result);
        }

        // The object keeps one name across all parents, so each must be free
        let id = ds.resolve(&path)?;
        for parent in ds.get_parents(id) {
            let sibling = parent.create_child_path(new_name)?;
            if ds.contains(&sibling) {
                result.push_error(OUTPUT_EXISTS, format!("{} already exists", sibling));
            }
        }
        if result.is_valid() {
            result.push_action(Action::Rename {
                path,
                new_name: new_name.to_string(),
            });
        }
        Ok(result)
    }
}

impl Filter for RenameDataObjectFilter {
    fn name(&self) -> &'static str {
        "rename_data_object"
    }

    fn class_name(&self) -> &'static str {
        "RenameDataObjectFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0x911a3aa9_d3c2_4f56_a56f_d4b1b1a51e2d)
    }

    fn human_name(&self) -> &'static str {
        "Rename Data Object"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Rename", "Memory Management"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "source_path",
                "Object to Rename",
                "",
                ParameterKind::ExistingPath { allowed: Vec::new() },
                DataPath::root(),
            ))
            .with(Parameter::new(
                "new_name",
                "New Name",
                "Must not contain the path separator",
                ParameterKind::String,
                "",
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

use crate::action::{Action, ActionMode, DeleteMode};
use crate::error::FilterResult;
use crate::filter::{Completion, Filter};
use crate::message::MessageHandler;
use crate::parameters::{Parameter, ParameterKind, Parameters};
use crate::result::ValidationResult;
use tessera_core::{Arguments, CancelFlag, DataPath, Result};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// Warning code when erasing an object that other containers also link
pub const ERASES_SHARED_OBJECT: i32 = -5501;
/// Code for a path removed or erased by an earlier entry of the same list
pub const OVERLAPPING_PATHS: i32 = -5502;

const MODE_OBJECT: &str = "object";
const MODE_PATH: &str = "path";

/// Remove objects from the graph
///
/// Mode `object` erases each object and every link to it; mode `path`
/// removes only the named links and never destroys an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteDataFilter;

impl DeleteDataFilter {
    fn plan(&self, ds: &DataStructure, args: &Arguments) -> Result<ValidationResult> {
        let paths = args.get_paths("removed_paths")?;
        let mode = match args.get_string("delete_mode")? {
            MODE_PATH => DeleteMode::JustPath,
            _ => DeleteMode::JustObject,
        };

        // Entries apply in order, so replay them on a metadata copy to catch
        // paths an earlier entry already removed
        let mut scratch = ds.preflight_copy();
        let mut result = ValidationResult::ok();
        for path in paths {
            let id = ds.resolve(&path)?;
            if mode == DeleteMode::JustObject {
                let links = ds.paths_of(id).len();
                if links > 1 {
                    result.push_warning(
                        ERASES_SHARED_OBJECT,
                        format!("{} is linked from {} places; all of them are removed", path, links),
                    );
                }
            }
            let action = Action::Delete { path, mode };
            if let Err(e) = action.apply(&mut scratch, ActionMode::Preflight) {
                result.push_error(
                    OVERLAPPING_PATHS,
                    format!("{} is already removed by an earlier entry: {}", action, e),
                );
                continue;
            }
            result.push_action(action);
        }
        Ok(result)
    }
}

impl Filter for DeleteDataFilter {
    fn name(&self) -> &'static str {
        "delete_data"
    }

    fn class_name(&self) -> &'static str {
        "DeleteDataFilter"
    }

    fn uuid(&self) -> Uuid {
        Uuid::from_u128(0xbf286740_e987_49fe_a7c8_6e566e3a0606)
    }

    fn human_name(&self) -> &'static str {
        "Delete Data"
    }

    fn default_tags(&self) -> Vec<&'static str> {
        vec!["Remove", "Delete", "Memory Management"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(Parameter::new(
                "removed_paths",
                "Objects to Delete",
                "Each path must resolve when the filter is validated",
                ParameterKind::ExistingPaths { allowed: Vec::new() },
                Vec::<DataPath>::new(),
            ))
            .with(Parameter::new(
                "delete_mode",
                "Delete Mode",
                "'object' erases the objects, 'path' removes only the links",
                ParameterKind::Choice(vec![MODE_OBJECT.to_string(), MODE_PATH.to_string()]),
                MODE_OBJECT,
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

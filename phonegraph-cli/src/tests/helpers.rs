//! Test helpers for composing phone-call datasets and layered overrides.

use super::*;
use std::fs;
use tempfile::TempDir;

const COMPANIES: &str = "<companies>\n\
    <company><name>Telecom</name></company>\n\
    <company><name>Mobile</name></company>\n\
    </companies>\n";

const PEOPLE: &str = "<people>\n\
    <person><first_name>Melli</first_name><last_name>Winchcum</last_name>\
    <phone_number>+7 171 898 0853</phone_number><city>London</city><age>55</age></person>\n\
    <person><phone_number>+86 921 547 9004</phone_number></person>\n\
    </people>\n";

const CONTRACTS: &str = "<contracts>\n\
    <contract><company_name>Telecom</company_name><person_id>+7 171 898 0853</person_id></contract>\n\
    </contracts>\n";

const CALLS: &str = "<calls>\n\
    <call><caller_id>+7 171 898 0853</caller_id><callee_id>+86 921 547 9004</callee_id>\
    <started_at>2018-09-19T01:00:38</started_at><duration>2851</duration></call>\n\
    </calls>\n";

/// Values a configuration file or the environment would contribute.
#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) data_dir: Option<Utf8PathBuf>,
    pub(super) calls: Option<Utf8PathBuf>,
    pub(super) transaction_policy: Option<TransactionPolicy>,
}

/// A scratch workspace with a complete data directory and an alternative
/// calls source.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let data = root.join("data");
        fs::create_dir_all(&data).expect("create data dir");
        for (name, contents) in [
            ("companies.xml", COMPANIES),
            ("people.xml", PEOPLE),
            ("contracts.xml", CONTRACTS),
            ("calls.xml", CALLS),
        ] {
            fs::write(data.join(name), contents).expect("write source");
        }
        fs::write(root.join("other-calls.xml"), "<calls>\n</calls>\n").expect("write calls");
        Self { _dir: dir, root }
    }

    pub(super) fn data_dir(&self) -> Utf8PathBuf {
        self.root.join("data")
    }

    pub(super) fn other_calls(&self) -> Utf8PathBuf {
        self.root.join("other-calls.xml")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("db/phone_calls.db")
    }

    pub(super) fn args(&self) -> LoadArgs {
        LoadArgs {
            data_dir: Some(self.data_dir()),
            database: Some(self.database()),
            ..LoadArgs::default()
        }
    }
}

/// Apply file and environment layers beneath the CLI values, mirroring the
/// precedence of the real configuration merge without touching process state.
pub(super) fn merge_layers(
    mut cli_args: LoadArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<LoadConfig, CliError> {
    merge_field(
        &mut cli_args.data_dir,
        extract_field(&env_layer, |layer| &layer.data_dir),
        extract_field(&file_layer, |layer| &layer.data_dir),
    );
    merge_field(
        &mut cli_args.calls,
        extract_field(&env_layer, |layer| &layer.calls),
        extract_field(&file_layer, |layer| &layer.calls),
    );
    merge_field(
        &mut cli_args.transaction_policy,
        extract_field(&env_layer, |layer| &layer.transaction_policy),
        extract_field(&file_layer, |layer| &layer.transaction_policy),
    );
    resolve_load_config(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}

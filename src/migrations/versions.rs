use crate::migrations::types;
use barrel::{backend::Pg, Migration};

macro_rules! version {
    ($builder:ident) => {
        Version::new(stringify!($builder), $builder)
    };
}

/// Schema versions in the order they are applied; only ever append here.
pub fn build() -> Vec<Version> {
    vec![version!(create_users), version!(create_plugin_kv)]
}

pub struct Version {
    name: &'static str,
    builder: fn() -> Migration,
}

impl Version {
    fn new(name: &'static str, builder: fn() -> Migration) -> Self {
        Self { name, builder }
    }

    /// Name in the `V<n>__<name>` form refinery expects, `number` starting at 1.
    pub fn file_name(&self, number: usize) -> String {
        format!("V{}__{}", number, self.name)
    }

    pub fn sql(&self) -> String {
        (self.builder)().make::<Pg>()
    }
}

fn create_users() -> Migration {
    let mut migration = Migration::new();
    migration.create_table("users", |table| {
        table.add_column("id", types::bigint().primary(true));
        table.add_column("first_name", types::varchar(255));
        table.add_column("last_name", types::varchar(255).nullable(true));
        table.add_column("username", types::varchar(255).nullable(true));
        table.add_column("created_at", types::utc_timestamp());
        table.add_column("updated_at", types::utc_timestamp().nullable(true));
        table.add_index("users_username_idx", types::index(&["username"]));
    });
    migration
}

fn create_plugin_kv() -> Migration {
    let mut migration = Migration::new();
    migration.create_table("plugin_kv", |table| {
        table.add_column("key", types::varchar(255).primary(true));
        table.add_column("value", types::binary());
        table.add_column("updated_at", types::utc_timestamp());
    });
    migration
}

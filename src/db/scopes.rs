//! Soft-delete scopes.
//!
//! Repositories start every read from `live()` (or add `not_deleted()` to a
//! join), so soft-deleted rows are excluded without each query remembering to.
//! `including_deleted()` is the only bypass.

macro_rules! soft_delete_scope {
    ($scope:ident, $table:ident) => {
        pub mod $scope {
            use crate::schema::$table;
            use diesel::prelude::*;
            use diesel::sqlite::Sqlite;

            pub type NotDeleted = diesel::dsl::Eq<$table::is_deleted, bool>;

            pub fn not_deleted() -> NotDeleted {
                $table::is_deleted.eq(false)
            }

            pub fn live<'a>() -> $table::BoxedQuery<'a, Sqlite> {
                $table::table.filter(not_deleted()).into_boxed()
            }

            pub fn including_deleted<'a>() -> $table::BoxedQuery<'a, Sqlite> {
                $table::table.into_boxed()
            }
        }
    };
}

soft_delete_scope!(equipment, equipment);
soft_delete_scope!(beans, beans);
soft_delete_scope!(bags, bags);
soft_delete_scope!(profiles, user_profiles);
soft_delete_scope!(shots, shot_records);

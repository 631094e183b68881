use crate::auth::roles::Role;
use crate::db::DbPool;
use anyhow::Result;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

pub fn seed_defaults(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get()?;
    seed_roles(&mut conn)?;
    Ok(())
}

fn seed_roles(conn: &mut SqliteConnection) -> Result<()> {
    use crate::schema::roles::dsl::*;

    for r in Role::ALL {
        let exists = roles
            .filter(role_name.eq(r.as_str()))
            .select(id)
            .first::<i32>(conn)
            .optional()?
            .is_some();

        if !exists {
            diesel::insert_into(roles)
                .values(role_name.eq(r.as_str()))
                .execute(conn)?;
            tracing::info!("Seeded role: {}", r);
        }
    }

    Ok(())
}

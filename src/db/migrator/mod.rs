use sea_orm_migration::prelude::*;

mod m20251123_initial;
mod m20251204_add_html_players;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251123_initial::Migration),
            Box::new(m20251204_add_html_players::Migration),
        ]
    }
}

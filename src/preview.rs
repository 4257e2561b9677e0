use anyhow::Result;
use log::info;

use crate::{
    cli::PreviewArgs,
    infer::DEFAULT_MAX_DEPTH,
    probe::{self, Prober},
    source::WarehouseSnapshot,
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let snapshot = WarehouseSnapshot::load(&args.input)?;
    let selection = probe::parse_selection(&args.tables)?;
    let settings = probe::settings_from_args(
        args.sample_rows,
        DEFAULT_MAX_DEPTH,
        args.expand_variant_objects,
    );
    let described = Prober::new(&snapshot, settings).describe_all(&selection)?;
    let rows = table::schema_rows(&described);
    table::print_table(&table::HEADERS, &rows);
    info!("Displayed {} schema path(s) from {:?}", rows.len(), args.input);
    Ok(())
}

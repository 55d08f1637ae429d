fn main() {
    use vergen::{BuildBuilder, CargoBuilder, Emitter};

    // Build metadata feeds the CLI's long --version form. Failure is
    // non-fatal; the binary falls back to the package version alone.
    let mut emitter = Emitter::default();
    if let Ok(build) = BuildBuilder::all_build() {
        let _ = emitter.add_instructions(&build);
    }
    if let Ok(cargo) = CargoBuilder::all_cargo() {
        let _ = emitter.add_instructions(&cargo);
    }
    if let Err(e) = emitter.emit() {
        eprintln!("vergen emit skipped: {e}");
    }
}

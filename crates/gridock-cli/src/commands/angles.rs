use crate::cli::AnglesArgs;
use crate::error::Result;
use gridock::core::rotations::AngleSet;
use gridock::engine::error::EngineError;
use std::io::Write;
use tracing::info;

pub fn run(args: AnglesArgs) -> Result<()> {
    let angles = AngleSet::generate(args.step).map_err(EngineError::from)?;
    info!(step = args.step, rotations = angles.len(), "Angle set generated.");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_listing(&mut out, &angles, args.list)?;
    out.flush()?;
    Ok(())
}

fn write_listing(out: &mut impl Write, angles: &AngleSet, list: bool) -> std::io::Result<()> {
    writeln!(
        out,
        "Angle step {} samples {} rotation(s).",
        angles.step(),
        angles.len()
    )?;
    if list {
        for (rotation, a) in angles.iter() {
            writeln!(out, "{:6}  {:4}{:4}{:4}", rotation, a.z_twist, a.theta, a.phi)?;
        }
    }
    Ok(())
}

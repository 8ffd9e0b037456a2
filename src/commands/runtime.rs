use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::RuntimeArgs;
use crate::runtime::{RuntimeEstimator, ScreenlogRuntimeEstimator};

pub fn run(args: RuntimeArgs) -> Result<()> {
    let estimator = ScreenlogRuntimeEstimator::new()?;
    let hours = estimator
        .hours_per_msample(&args.run_dir)
        .with_context(|| format!("no runtime estimate for {}", args.run_dir.display()))?;

    info!(
        run_dir = %args.run_dir.display(),
        hours_per_msample = hours,
        "runtime estimate"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_estimate(&mut output, &args.run_dir, hours)?;
    output.flush()?;
    Ok(())
}

fn write_estimate(output: &mut impl Write, run_dir: &Path, hours: f64) -> Result<()> {
    writeln!(output, "Run: {}", run_dir.display())?;
    writeln!(output, "Hours per Msample: {hours:.4}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_written_as_plain_text() {
        let mut output = Vec::new();
        write_estimate(&mut output, Path::new("runs/bantu/bantu-1"), 0.0125).expect("writes");
        assert_eq!(
            String::from_utf8(output).expect("utf8"),
            "Run: runs/bantu/bantu-1\nHours per Msample: 0.0125\n"
        );
    }
}

//! Plain-text result writers
//!
//! Displacement components go to one-value-per-line `.dat` files in node id
//! order. Matrices and vectors can also be dumped as MATLAB scripts for
//! offline inspection of the assembled system.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};

use crate::error::FeaResult;
use crate::results::DisplacementField;

/// File name for the per-node displacement magnitude
pub const TOTAL_FILE: &str = "disp_total.dat";
/// File name for the X displacement component
pub const U_FILE: &str = "disp_u.dat";
/// File name for the Y displacement component
pub const V_FILE: &str = "disp_v.dat";

/// Write the displacement field as three `.dat` files in `dir`
///
/// `disp_u.dat` and `disp_v.dat` hold the components and `disp_total.dat`
/// the per-node magnitude, one value per line in node id order. The
/// directory is created if missing. Returns the paths written.
pub fn write_displacement_files(dir: &Path, field: &DisplacementField) -> FeaResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let total: Vec<f64> = (1..=field.n_nodes())
        .map(|id| field.magnitude(id))
        .collect();

    let paths = vec![dir.join(TOTAL_FILE), dir.join(U_FILE), dir.join(V_FILE)];
    write_column(&paths[0], &total)?;
    write_column(&paths[1], &field.u)?;
    write_column(&paths[2], &field.v)?;
    Ok(paths)
}

fn write_column(path: &Path, values: &[f64]) -> FeaResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for value in values {
        writeln!(file, "{value:.12e}")?;
    }
    file.flush()?;
    Ok(())
}

/// Dump a dense matrix as a MATLAB script `Mat_<name>.m` in `dir`
///
/// The script assigns the matrix to a variable called `name`, one matrix row
/// per line. Returns the path written.
pub fn write_matrix_matlab(dir: &Path, name: &str, matrix: &DMatrix<f64>) -> FeaResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("Mat_{name}.m"));
    let mut file = BufWriter::new(File::create(&path)?);

    writeln!(file, "% {} ({} x {})", name, matrix.nrows(), matrix.ncols())?;
    writeln!(file, "{name} = [")?;
    for row in 0..matrix.nrows() {
        for col in 0..matrix.ncols() {
            write!(file, " {:.12e}", matrix[(row, col)])?;
        }
        writeln!(file, " ;")?;
    }
    writeln!(file, "];")?;
    file.flush()?;
    Ok(path)
}

/// Dump a vector as a single-column MATLAB script `Mat_<name>.m` in `dir`
pub fn write_vector_matlab(dir: &Path, name: &str, vector: &DVector<f64>) -> FeaResult<PathBuf> {
    let column = DMatrix::from_column_slice(vector.len(), 1, vector.as_slice());
    write_matrix_matlab(dir, name, &column)
}

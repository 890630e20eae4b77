// src/bin/eigenfaces.rs

use std::path::PathBuf;

use argh::FromArgs;
use eigenface_pca::kernel::{Kernel, DEFAULT_RBF_GAMMA};
use eigenface_pca::pipeline::{self, RecognitionConfig};
use eigenface_pca::subspace::DEFAULT_N_COMPONENTS;
use eigenface_pca::{FaceSpaceError, FeatureDimension, KernelAxis, SubspaceMethod};

/// Recognizes faces by nearest neighbor in a PCA or kernel PCA subspace
#[derive(Debug, FromArgs)]
struct Args {
    /// directory of training images
    #[argh(option, short = 't')]
    train: PathBuf,

    /// directory of testing images
    #[argh(option, short = 'e')]
    test: PathBuf,

    /// subspace method: pca, linear or rbf
    #[argh(option, short = 'm', default = "SubspaceMethod::Pca")]
    method: SubspaceMethod,

    /// kernel axis for linear and rbf: features or samples
    #[argh(option, default = "KernelAxis::Features")]
    axis: KernelAxis,

    /// number of retained components
    #[argh(option, short = 'k', default = "DEFAULT_N_COMPONENTS")]
    components: usize,

    /// rbf bandwidth
    #[argh(option, default = "DEFAULT_RBF_GAMMA")]
    gamma: f64,

    /// resized image width
    #[argh(option, default = "60")]
    width: u32,

    /// resized image height
    #[argh(option, default = "60")]
    height: u32,

    /// directory for reconstructed faces and eigenfaces
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// json configuration replacing method, axis, components, gamma and size
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

impl Args {
    fn recognition_config(&self) -> Result<RecognitionConfig, FaceSpaceError> {
        if let Some(path) = &self.config {
            log::info!("Reading configuration from {}", path.display());
            return RecognitionConfig::from_json_file(path);
        }
        let method = match self.method {
            SubspaceMethod::KernelPca {
                kernel: Kernel::Rbf { .. },
                ..
            } => SubspaceMethod::kernel(Kernel::rbf(self.gamma)?),
            other => other,
        }
        .with_axis(self.axis);
        let config = RecognitionConfig {
            n_components: self.components,
            method,
            dimension: FeatureDimension::new(self.width, self.height)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let config = args.recognition_config()?;
    let report = pipeline::run(config, &args.train, &args.test, args.output.as_deref()).map_err(|e| {
        match e.stage() {
            Some(stage) => log::error!("Stopped while {}: {}", stage, e),
            None => log::error!("{}", e),
        }
        e
    })?;

    println!(
        "Accuracy of {} with {} components = {:.4} ({}/{} correct)",
        report.method,
        report.n_components,
        report.accuracy,
        report
            .predictions
            .iter()
            .zip(&report.expected)
            .filter(|(p, e)| p == e)
            .count(),
        report.n_test
    );
    if let Some(err) = report.train_reconstruction_error {
        println!("Training reconstruction MSE = {:.3}", err);
    }
    Ok(())
}

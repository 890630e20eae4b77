use eigenface_pca::kernel::Kernel;
use eigenface_pca::{SubspaceExtractor, SubspaceMethod};
use ndarray::Array2;

fn main() {
    // Four tiny "images" of three pixels each
    let data = Array2::from_shape_vec(
        (4, 3),
        vec![1.0, 2.0, 0.5, 3.0, 4.0, 1.0, 5.0, 6.0, 2.5, 0.0, 1.0, 3.0],
    )
    .unwrap();

    for method in [SubspaceMethod::Pca, SubspaceMethod::kernel(Kernel::Linear)] {
        let fitted = SubspaceExtractor::new(method, 2)
            .fit(data.view())
            .expect("subspace fit failed");
        println!("{} backend test works!", method);
        println!("Basis shape: {:?}", fitted.basis().map(|b| b.vectors.dim()));
        println!("Explained variance ratio: {:?}", fitted.explained_variance_ratio());
    }
}

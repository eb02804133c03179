//! # Activation Functions Module
//!
//! Element-wise non-linearities applied by dense layers. The action-value
//! estimator uses ReLU on hidden layers and a linear output layer, which is the
//! usual choice for Q-value regression since values are unbounded.
//!
//! ```rust
//! use volley::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;

pub mod grad_check;

pub use grad_check::{
    grad_check_full, grad_check_sparse, numerical_gradient, relative_error, GradCheckReport, GradSample,
};

#![forbid(unsafe_code)]

pub mod certificate_service;
pub mod course_services;
pub mod enrollment_service;
pub mod error;
pub mod keyword_grader;
pub mod progress_service;

pub use pcteacher_core::time::Clock;

pub use certificate_service::{CertificateEligibility, CertificateService, IssuedCertificate};
pub use course_services::CourseServices;
pub use enrollment_service::EnrollmentService;
pub use error::{CertificateError, CourseServicesError, EnrollmentError, ProgressError};
pub use keyword_grader::KeywordGrader;
pub use progress_service::ProgressService;

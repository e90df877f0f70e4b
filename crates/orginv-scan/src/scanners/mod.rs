//! Built-in AWS resource scanners

mod ec2;
mod iam;
mod lambda;
mod rds;
mod s3;
mod vpc;

pub use ec2::Ec2InstanceScanner;
pub use iam::IamRoleScanner;
pub use lambda::LambdaFunctionScanner;
pub use rds::RdsInstanceScanner;
pub use s3::S3BucketScanner;
pub use vpc::VpcScanner;

pub mod check;
pub mod unlock;

use crate::error::ProxsaveError;
use crate::types::CheckCode;

pub fn exit_code_for(code: CheckCode) -> i32 {
    match code {
        CheckCode::LockBusy => 3,
        CheckCode::DiskSpaceLow | CheckCode::DiskStatFailed => 4,
        CheckCode::PermissionDenied
        | CheckCode::FsReadonly
        | CheckCode::FsIoError
        | CheckCode::PermissionCheckFailed => 5,
        CheckCode::NotDirectory
        | CheckCode::StatFailed
        | CheckCode::CreateFailed
        | CheckCode::VerifyFailed
        | CheckCode::NotWritable
        | CheckCode::NoSymlinkSupport => 6,
        CheckCode::PermissionCheck
        | CheckCode::LockStatFailed
        | CheckCode::LockCreateFailed
        | CheckCode::LockRemoveFailed => 1,
    }
}

pub fn exit_for_error(err: &ProxsaveError) -> ! {
    let code = match err {
        ProxsaveError::Check { code, .. } => exit_code_for(*code),
        ProxsaveError::Config(_) => 2,
        ProxsaveError::Cancelled => 130,
        _ => 1,
    };
    println!("{}", err);
    std::process::exit(code);
}

use tracing::debug;

use crate::channel::EmployeeChannel;
use crate::driver::error::CallError;
use crate::employee_proto::{EmployeeResponse, GetByNoRequest};
use crate::metadata::CallMetadata;

/// Send one request with `metadata` attached and wait for its single response.
///
/// A failed call is returned as [`CallError::Status`] with the server's trailing metadata intact,
/// so [`classify`](crate::classify::classify) can tell permission failures apart and report the
/// diagnostics.
pub async fn call<C>(
    channel: &C,
    request: GetByNoRequest,
    metadata: CallMetadata,
) -> Result<EmployeeResponse, CallError>
where
    C: EmployeeChannel + ?Sized,
{
    debug!(no = request.no, headers = metadata.len(), "Unary call");

    let request = metadata.into_request(request)?;
    let response = channel.get_by_no(request).await?;

    Ok(response.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::{MockChannel, employee_response};
    use tonic::metadata::MetadataMap;
    use tonic::{Code, Status};

    #[tokio::test]
    async fn test_response_is_returned() {
        let channel = MockChannel::default().with_unary(vec![Ok(employee_response(1994, "guo"))]);

        let response = call(&channel, GetByNoRequest { no: 1994 }, CallMetadata::new())
            .await
            .unwrap();

        assert_eq!(response.employee.unwrap().no, 1994);
    }

    #[tokio::test]
    async fn test_metadata_reaches_channel() {
        let channel = MockChannel::default().with_unary(vec![Ok(employee_response(1, "a"))]);
        let metadata = CallMetadata::new()
            .with("Authorization", "Bearer tok")
            .with("username", "kael");

        call(&channel, GetByNoRequest { no: 1 }, metadata)
            .await
            .unwrap();

        let seen = channel.unary_metadata.lock().unwrap();
        assert_eq!(seen[0].get("authorization").unwrap(), "Bearer tok");
        assert_eq!(seen[0].get("username").unwrap(), "kael");
    }

    #[tokio::test]
    async fn test_failure_keeps_trailers() {
        let mut trailers = MetadataMap::new();
        trailers.insert("reason", "level too low".parse().unwrap());
        let channel = MockChannel::default().with_unary(vec![Err(Status::with_metadata(
            Code::PermissionDenied,
            "denied",
            trailers,
        ))]);

        let err = call(&channel, GetByNoRequest { no: 1 }, CallMetadata::new())
            .await
            .unwrap_err();

        let status = err.status().unwrap();
        assert_eq!(status.code(), Code::PermissionDenied);
        assert_eq!(status.metadata().get("reason").unwrap(), "level too low");
    }

    #[tokio::test]
    async fn test_invalid_metadata_never_reaches_channel() {
        let channel = MockChannel::default();
        let metadata = CallMetadata::new().with("bad key", "value");

        let err = call(&channel, GetByNoRequest { no: 1 }, metadata)
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::InvalidMetadata { .. }));
        assert!(channel.unary_metadata.lock().unwrap().is_empty());
    }
}

use tonic::{Request, Response, Status};

use crate::domain::Gender;
use crate::grpc::timestamp_to_wire;
use crate::proto::sso_profile_server::SsoProfile;
use crate::proto::{GetProfileRequest, GetProfileResponse};
use crate::usecase;

/// Profile read surface.
pub struct SsoProfileService {
    profile: usecase::Profile,
}

impl SsoProfileService {
    pub fn new(profile: usecase::Profile) -> Self {
        Self { profile }
    }
}

#[tonic::async_trait]
impl SsoProfile for SsoProfileService {
    async fn get_profile(
        &self,
        request: Request<GetProfileRequest>,
    ) -> Result<Response<GetProfileResponse>, Status> {
        let req = request.into_inner();
        if req.user_id == 0 {
            return Err(Status::invalid_argument("user ID is empty"));
        }

        let profile = self
            .profile
            .execute(req.user_id)
            .await
            .map_err(|err| err.to_status("failed to get user profile"))?;

        Ok(Response::new(GetProfileResponse {
            user_id: profile.id,
            username: profile.username,
            fio: profile.full_name,
            date_of_birth: profile.date_of_birth.map(timestamp_to_wire),
            gender: profile.gender.map(Gender::as_i16).unwrap_or(0) as i32,
            avatar_file_key: profile.avatar_file_key,
        }))
    }
}

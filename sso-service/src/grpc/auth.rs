use tonic::{Request, Response, Status};

use crate::grpc::{gender_from_wire, required, timestamp_from_wire};
use crate::proto::sso_server::Sso;
use crate::proto::{
    LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, RefreshTokensRequest,
    RefreshTokensResponse, RegisterRequest, RegisterResponse,
};
use crate::usecase;

/// Authentication surface.
pub struct SsoService {
    login: usecase::Login,
    register: usecase::Register,
    refresh_tokens: usecase::RefreshTokens,
    logout: usecase::Logout,
}

impl SsoService {
    pub fn new(
        login: usecase::Login,
        register: usecase::Register,
        refresh_tokens: usecase::RefreshTokens,
        logout: usecase::Logout,
    ) -> Self {
        Self { login, register, refresh_tokens, logout }
    }
}

#[tonic::async_trait]
impl Sso for SsoService {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();
        validate_login_request(&req)?;

        let tokens = self
            .login
            .execute(usecase::LoginParams {
                username: req.username,
                password: req.password,
                client_code: req.client_code,
                user_agent: req.user_agent,
                fingerprint: req.fingerprint,
                issuer: req.issuer,
            })
            .await
            .map_err(|err| err.to_status("failed to login"))?;

        Ok(Response::new(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }))
    }

    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();
        validate_register_request(&req)?;

        let date_of_birth = timestamp_from_wire(req.date_of_birth)?;
        let gender = gender_from_wire(req.gender)?;

        let tokens = self
            .register
            .execute(usecase::RegisterParams {
                username: req.username,
                password: req.password,
                client_code: req.client_code,
                full_name: req.fio,
                date_of_birth,
                gender,
                avatar_file_key: req.avatar_file_key,
                user_agent: req.user_agent,
                fingerprint: req.fingerprint,
                issuer: req.issuer,
            })
            .await
            .map_err(|err| err.to_status("failed to register"))?;

        Ok(Response::new(RegisterResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }))
    }

    async fn refresh_tokens(
        &self,
        request: Request<RefreshTokensRequest>,
    ) -> Result<Response<RefreshTokensResponse>, Status> {
        let req = request.into_inner();
        validate_refresh_tokens_request(&req)?;

        let tokens = self
            .refresh_tokens
            .execute(usecase::RefreshTokensParams {
                refresh_token: req.refresh_token,
                client_code: req.client_code,
                user_agent: req.user_agent,
                fingerprint: req.fingerprint,
                issuer: req.issuer,
            })
            .await
            .map_err(|err| err.to_status("failed to refresh tokens"))?;

        Ok(Response::new(RefreshTokensResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let req = request.into_inner();
        validate_logout_request(&req)?;

        self.logout
            .execute(usecase::LogoutParams {
                refresh_token: req.refresh_token,
                client_code: req.client_code,
            })
            .await
            .map_err(|err| err.to_status("failed to logout"))?;

        Ok(Response::new(LogoutResponse { success: true }))
    }
}

fn validate_login_request(req: &LoginRequest) -> Result<(), Status> {
    required(&req.username, "username is empty")?;
    required(&req.password, "password is empty")?;
    required(&req.client_code, "client code is empty")?;
    required(&req.user_agent, "user agent is empty")?;
    required(&req.fingerprint, "fingerprint is empty")?;
    required(&req.issuer, "issuer is empty")?;
    Ok(())
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), Status> {
    required(&req.username, "username is empty")?;
    required(&req.password, "password is empty")?;
    required(&req.client_code, "client code is empty")?;
    required(&req.fio, "fio is empty")?;
    required(&req.user_agent, "user agent is empty")?;
    required(&req.fingerprint, "fingerprint is empty")?;
    required(&req.issuer, "issuer is empty")?;
    Ok(())
}

fn validate_refresh_tokens_request(req: &RefreshTokensRequest) -> Result<(), Status> {
    required(&req.refresh_token, "refresh token is empty")?;
    required(&req.client_code, "client code is empty")?;
    required(&req.user_agent, "user agent is empty")?;
    required(&req.fingerprint, "fingerprint is empty")?;
    required(&req.issuer, "issuer is empty")?;
    Ok(())
}

fn validate_logout_request(req: &LogoutRequest) -> Result<(), Status> {
    required(&req.refresh_token, "refresh token is empty")?;
    required(&req.client_code, "client code is empty")?;
    Ok(())
}

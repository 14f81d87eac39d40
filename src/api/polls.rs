use rocket::{
    http::Status,
    serde::json::{self, Json},
    Route, State,
};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            poll::{PollDescription, PollSpec},
        },
        mongodb::Id,
    },
    voting::VotingService,
};

use super::bad_json;

pub fn routes() -> Vec<Route> {
    routes![polls, poll, create_poll, update_poll, delete_poll]
}

/// List all polls with their current tallies, newest first.
#[get("/polls")]
pub async fn polls(service: &State<VotingService>) -> Result<Json<Vec<PollDescription>>> {
    let polls = service.list_polls().await?;
    Ok(Json(polls.into_iter().map(Into::into).collect()))
}

/// A single poll with its current tallies.
#[get("/polls/<poll_id>")]
pub async fn poll(poll_id: Id, service: &State<VotingService>) -> Result<Json<PollDescription>> {
    Ok(Json(service.get_poll(poll_id).await?.into()))
}

#[post("/polls", data = "<spec>", format = "json")]
pub async fn create_poll(
    token: AuthToken,
    spec: std::result::Result<Json<PollSpec>, json::Error<'_>>,
    service: &State<VotingService>,
) -> Result<Json<PollDescription>> {
    let spec = spec.map_err(bad_json)?.into_inner();
    Ok(Json(service.create_poll(spec, token.id).await?.into()))
}

#[put("/polls/<poll_id>", data = "<spec>", format = "json")]
pub async fn update_poll(
    token: AuthToken,
    poll_id: Id,
    spec: std::result::Result<Json<PollSpec>, json::Error<'_>>,
    service: &State<VotingService>,
) -> Result<Json<PollDescription>> {
    let spec = spec.map_err(bad_json)?.into_inner();
    Ok(Json(service.update_poll(poll_id, spec, token.id).await?.into()))
}

#[delete("/polls/<poll_id>")]
pub async fn delete_poll(
    token: AuthToken,
    poll_id: Id,
    service: &State<VotingService>,
) -> Result<Status> {
    service.delete_poll(poll_id, token.id).await?;
    Ok(Status::Ok)
}

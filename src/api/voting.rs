use rocket::{
    serde::json::{self, Json},
    Route, State,
};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            poll::{PollDescription, VoteRequest},
        },
        mongodb::Id,
    },
    voting::VotingService,
};

use super::bad_json;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// Cast the authenticated user's single vote on a poll, returning the poll
/// with the vote applied.
#[post("/polls/<poll_id>/vote", data = "<request>", format = "json")]
pub async fn cast_vote(
    token: AuthToken,
    poll_id: Id,
    request: std::result::Result<Json<VoteRequest>, json::Error<'_>>,
    service: &State<VotingService>,
) -> Result<Json<PollDescription>> {
    let request = request.map_err(bad_json)?.into_inner();
    let poll = service
        .cast_vote(poll_id, token.id, request.option_id)
        .await?;
    Ok(Json(poll.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rocket::{
        http::{ContentType, Status},
        serde::json::serde_json::{self, json},
    };

    use crate::api::polls::rocket_uri_macro_poll;
    use crate::model::api::poll::PollSpec;
    use crate::store::PollStore;
    use crate::testing::{bearer, client, create_poll, register_user};

    use super::*;

    #[rocket::async_test]
    async fn votes_accumulate_per_option() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;
        let bob = register_user(&client, "bob", "bob@example.com", "battery-staple").await;
        // A two-option poll: "Tabs" and "Spaces".
        let created = create_poll(&client, &alice.token, &PollSpec::example2()).await;

        // Alice votes for the first option.
        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let after_alice: PollDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(1, after_alice.options[0].votes);
        assert_eq!(0, after_alice.options[1].votes);
        assert_eq!(1, after_alice.total_votes);
        assert_eq!(vec![alice.user.id], after_alice.voters);

        // Bob votes for the same option.
        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&bob.token))
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let after_bob: PollDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(2, after_bob.options[0].votes);
        assert_eq!(0, after_bob.options[1].votes);
        assert_eq!(2, after_bob.total_votes);

        // Alice tries again and is rejected.
        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 2 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // Both votes are visible to everyone, nothing else changed.
        let response = client.get(uri!(poll(*created.id))).dispatch().await;
        let fetched: PollDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(2, fetched.options[0].votes);
        assert_eq!(0, fetched.options[1].votes);
        assert_eq!(2, fetched.total_votes);
        assert_eq!(2, fetched.voters.len());
    }

    #[rocket::async_test]
    async fn one_vote_per_user() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;
        let created = create_poll(&client, &alice.token, &PollSpec::example()).await;

        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        // Voting again is rejected, even for a different option.
        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 2 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!("already-voted", body["code"]);

        // The tallies are unchanged.
        let response = client.get(uri!(poll(*created.id))).dispatch().await;
        let fetched: PollDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(1, fetched.options[0].votes);
        assert_eq!(0, fetched.options[1].votes);
        assert_eq!(1, fetched.total_votes);
    }

    #[rocket::async_test]
    async fn voting_requires_authentication() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;
        let created = create_poll(&client, &alice.token, &PollSpec::example()).await;

        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[rocket::async_test]
    async fn vote_on_unknown_poll_not_found() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;

        let response = client
            .post(uri!(cast_vote(Id::new())))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!("not-found", body["code"]);
    }

    #[rocket::async_test]
    async fn invalid_option_rejected() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;
        let created = create_poll(&client, &alice.token, &PollSpec::example()).await;

        let response = client
            .post(uri!(cast_vote(*created.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 99 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!("invalid-option", body["code"]);
    }

    #[rocket::async_test]
    async fn expired_poll_is_gone() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;

        // An expired poll can't be created through the API, so seed the
        // store with one directly.
        let mut poll = PollSpec::example().into_poll(*alice.user.id).unwrap();
        poll.expires_at = Utc::now() - Duration::hours(1);
        let store = client.rocket().state::<Arc<dyn PollStore>>().unwrap();
        let seeded = store.insert(poll).await.unwrap();

        let response = client
            .post(uri!(cast_vote(seeded.id)))
            .header(ContentType::JSON)
            .header(bearer(&alice.token))
            .body(json!({ "option_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Gone, response.status());

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!("poll-expired", body["code"]);
    }

    #[rocket::async_test]
    async fn malformed_votes_rejected() {
        let client = client().await;
        let alice = register_user(&client, "alice", "alice@example.com", "correct-horse").await;
        let created = create_poll(&client, &alice.token, &PollSpec::example()).await;

        for body in [r#"{"option_id": "one"}"#, r#"{"option_id":"#, r#"{}"#] {
            let response = client
                .post(uri!(cast_vote(*created.id)))
                .header(ContentType::JSON)
                .header(bearer(&alice.token))
                .body(body)
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status());
        }
    }
}

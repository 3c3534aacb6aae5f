//! Room-wide round transitions triggered by aggregate conditions.

use cardroom_collaborator::Collaborator;
use cardroom_protocol::{GameCode, Message, Start, Status};
use cardroom_transport::Connection;

use crate::SyncEngine;

impl<C: Connection, P: Collaborator> SyncEngine<C, P> {
    /// Starts a round if every member of `code` is ready.
    ///
    /// The room is claimed under the lock before the prompt fetch, so
    /// concurrent triggers start it at most once. A failed fetch hands the
    /// room back to the lobby with ready flags intact; the next qualifying
    /// event retries. Returns `true` if this call started the round.
    pub(crate) async fn try_start_round(&self, code: &GameCode) -> bool {
        let claimed = self.registry().lock().await.claim_round_start(code);
        if !claimed {
            return false;
        }

        let text = match self.collaborator().fetch_prompt_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    game_code = %code,
                    error = %e,
                    "prompt fetch failed, round start aborted"
                );
                self.registry().lock().await.abort_round_start(code);
                return false;
            }
        };

        let members = self.registry().lock().await.commit_round_start(code);
        tracing::info!(
            game_code = %code,
            members = members.len(),
            "round started"
        );

        let start = Message::Start(Start {
            game_code: code.clone(),
            start: true,
            text,
        });
        self.broadcast_message(code, &start).await;
        for user in members {
            let reset = Message::Status(Status { user, status: false });
            self.broadcast_message(code, &reset).await;
        }
        true
    }

    /// Ends the round if every in-round member has acted.
    ///
    /// Returns `true` if this call ended the round.
    pub(crate) async fn try_finish_round(&self, code: &GameCode) -> bool {
        let finished =
            self.registry().lock().await.finish_round_if_all_moved(code);
        if !finished {
            return false;
        }
        tracing::info!(game_code = %code, "round finished");
        self.broadcast_message(code, &Message::DeleteCards).await;
        true
    }
}

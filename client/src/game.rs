use log::{debug, info};
use shared::physics::{LOCAL_MALLET_COLOR, REMOTE_MALLET_COLOR};
use shared::{
    handle_walls, lerp, resolve_collision, ClientMessage, Goal, Mallet, MoveUpdate, Puck, Scorer,
    ServerMessage, REMOTE_BLEND, TABLE_HEIGHT, TABLE_WIDTH, TICK_RATE,
};

/// Longest frame the simulation will catch up on
const MAX_FRAME_TIME: f32 = 1.0 / 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub me: u32,
    pub opp: u32,
}

/// Local view of a match: both mallets, the puck, score and connection status.
///
/// The local player always plays from the left half. Everything sent to the
/// opponent is mirrored into their frame, and everything received is already
/// in ours.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub me: Mallet,
    pub opp: Mallet,
    pub puck: Puck,
    pub pointer: (f32, f32),
    pub score: Score,
    pub code: Option<String>,
    pub connected: bool,
    pub started: bool,
    pub status: String,
    pub tick: u64,
}

impl MatchState {
    pub fn new() -> Self {
        let home = (TABLE_WIDTH / 8.0, TABLE_HEIGHT / 2.0);

        Self {
            me: Mallet::new(home.0, home.1, LOCAL_MALLET_COLOR),
            opp: Mallet::new(TABLE_WIDTH - home.0, home.1, REMOTE_MALLET_COLOR),
            puck: Puck::new(),
            pointer: home,
            score: Score::default(),
            code: None,
            connected: false,
            started: false,
            status: "Tab: create | code + Enter: join | Ctrl+C: copy".to_string(),
            tick: 0,
        }
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = (x, y);
    }

    /// Advances the table by one tick.
    ///
    /// Returns the `score` frame to send when the puck went into our own goal.
    /// A puck in the opponent's goal is only reset here; their client reports
    /// it and the point arrives through [`MatchState::apply_remote_score`].
    pub fn step(&mut self) -> Option<ClientMessage> {
        self.tick += 1;

        let (target_x, target_y) = self.pointer;
        self.me.follow(target_x, target_y, true);

        self.puck.advance();
        if resolve_collision(&self.me, &mut self.puck) {
            debug!("Strike, puck speed {:.1}", self.puck.speed());
        }
        resolve_collision(&self.opp, &mut self.puck);

        let goal = handle_walls(&mut self.puck)?;
        self.puck.reset();

        match goal {
            Goal::Left => {
                self.score.opp += 1;
                info!("Goal conceded, score {}:{}", self.score.me, self.score.opp);
                Some(ClientMessage::Score { who: Scorer::Opp })
            }
            Goal::Right => {
                debug!("Puck entered opponent goal, awaiting their report");
                None
            }
        }
    }

    /// Mallet and puck state mirrored into the opponent's frame.
    pub fn outgoing_move(&self) -> MoveUpdate {
        MoveUpdate {
            ox: Some(TABLE_WIDTH - self.me.x),
            oy: Some(self.me.y),
            px: Some(TABLE_WIDTH - self.puck.x),
            py: Some(self.puck.y),
            pvx: Some(-self.puck.vx),
            pvy: Some(self.puck.vy),
        }
    }

    /// Takes the opponent mallet as received and blends the puck toward the
    /// received puck. Missing puck fields keep the local value.
    pub fn apply_remote_move(&mut self, update: &MoveUpdate) {
        if let (Some(ox), Some(oy)) = (update.ox, update.oy) {
            self.opp.vx = ox - self.opp.x;
            self.opp.vy = oy - self.opp.y;
            self.opp.x = ox;
            self.opp.y = oy;
        }

        if let Some(px) = update.px {
            let puck = &mut self.puck;
            puck.x = lerp(puck.x, px, REMOTE_BLEND);
            puck.y = lerp(puck.y, update.py.unwrap_or(puck.y), REMOTE_BLEND);
            puck.vx = lerp(puck.vx, update.pvx.unwrap_or(puck.vx), REMOTE_BLEND);
            puck.vy = lerp(puck.vy, update.pvy.unwrap_or(puck.vy), REMOTE_BLEND);
        }
    }

    /// `who` is relative to the sender: `me` means the opponent scored.
    pub fn apply_remote_score(&mut self, who: Scorer) {
        match who {
            Scorer::Me => self.score.opp += 1,
            Scorer::Opp => self.score.me += 1,
        }
        self.puck.reset();
        info!("Score {}:{}", self.score.me, self.score.opp);
    }

    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Created { code } => {
                self.status = format!("Share code: {}", code);
                self.code = Some(code);
            }
            ServerMessage::Start => {
                self.started = true;
                self.status = format!("Match started ({})", self.code.as_deref().unwrap_or(""));
                self.puck.reset();
            }
            ServerMessage::Error { message } => {
                self.status = format!("Error: {}", message);
            }
            ServerMessage::Move(update) => self.apply_remote_move(&update),
            ServerMessage::Score { who } => self.apply_remote_score(who),
        }
    }

    /// Remembers the code we asked to join so `start` can display it.
    pub fn request_join(&mut self, code: &str) {
        self.code = Some(code.to_string());
        self.status = format!("Joining {}...", code);
    }

    /// Code to put on the clipboard: the one in the entry box, if any.
    pub fn copy_code(&mut self, typed: &str) -> Option<String> {
        let code = typed.trim();
        if code.is_empty() {
            return None;
        }
        self.status = format!("Code {} copied!", code);
        Some(code.to_string())
    }

    pub fn on_connected(&mut self) {
        self.connected = true;
        self.status = "Connected".to_string();
    }

    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.started = false;
        self.status = "Disconnected".to_string();
    }

    /// Whether this tick's state should go out to the opponent.
    pub fn should_broadcast(&self) -> bool {
        self.connected && self.started
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts variable frame times into whole simulation ticks.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    accumulator: f32,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a frame's duration and returns how many ticks are now due.
    pub fn advance(&mut self, frame_time: f32) -> u32 {
        let tick = 1.0 / TICK_RATE as f32;
        self.accumulator += frame_time.clamp(0.0, MAX_FRAME_TIME);

        let mut ticks = 0;
        while self.accumulator >= tick {
            self.accumulator -= tick;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{GOAL_HEIGHT, PUCK_RADIUS};

    #[test]
    fn test_initial_positions() {
        let game = MatchState::new();
        assert_eq!(game.me.x, TABLE_WIDTH / 8.0);
        assert_eq!(game.opp.x, 7.0 * TABLE_WIDTH / 8.0);
        assert_eq!(game.puck.x, TABLE_WIDTH / 2.0);
        assert!(!game.should_broadcast());
    }

    #[test]
    fn test_mallet_follows_pointer() {
        let mut game = MatchState::new();
        game.set_pointer(300.0, 100.0);

        let start = game.me.clone();
        game.step();
        assert!(game.me.x > start.x);
        assert!(game.me.y < start.y);

        for _ in 0..200 {
            game.step();
        }
        assert_approx_eq!(game.me.x, 300.0, 0.1);
        assert_approx_eq!(game.me.y, 100.0, 0.1);
    }

    #[test]
    fn test_mallet_stays_on_own_half() {
        let mut game = MatchState::new();
        game.set_pointer(TABLE_WIDTH, TABLE_HEIGHT / 4.0);
        for _ in 0..200 {
            game.step();
        }
        assert!(game.me.x <= TABLE_WIDTH / 2.0 - game.me.r);
    }

    #[test]
    fn test_mallet_strike_launches_puck() {
        let mut game = MatchState::new();
        game.me.x = TABLE_WIDTH / 2.0 - 80.0;
        game.me.y = TABLE_HEIGHT / 2.0;
        game.puck.x = game.me.x + 40.0;
        game.set_pointer(TABLE_WIDTH / 2.0, TABLE_HEIGHT / 2.0);

        assert_eq!(game.puck.speed(), 0.0);
        game.step();
        assert!(game.puck.speed() > 0.0);
        assert!(game.puck.vx > 0.0);
    }

    #[test]
    fn test_own_goal_scores_for_opponent_and_reports() {
        let mut game = MatchState::new();
        game.me.y = PUCK_RADIUS;
        game.set_pointer(game.me.x, PUCK_RADIUS);
        game.puck.x = 2.0;
        game.puck.vx = -5.0;

        let msg = game.step();
        assert_eq!(msg, Some(ClientMessage::Score { who: Scorer::Opp }));
        assert_eq!(game.score, Score { me: 0, opp: 1 });
        assert_eq!(game.puck.x, TABLE_WIDTH / 2.0);
        assert_eq!(game.puck.vx, 0.0);
    }

    #[test]
    fn test_opponent_goal_waits_for_report() {
        let mut game = MatchState::new();
        game.opp.y = PUCK_RADIUS;
        game.puck.x = TABLE_WIDTH - 2.0;
        game.puck.vx = 5.0;

        assert_eq!(game.step(), None);
        assert_eq!(game.score, Score::default());
        assert_eq!(game.puck.x, TABLE_WIDTH / 2.0);

        game.apply_remote_score(Scorer::Opp);
        assert_eq!(game.score, Score { me: 1, opp: 0 });
    }

    #[test]
    fn test_remote_score_from_sender_point_of_view() {
        let mut game = MatchState::new();
        game.puck.x = 10.0;
        game.apply_remote_score(Scorer::Me);
        assert_eq!(game.score, Score { me: 0, opp: 1 });
        assert_eq!(game.puck.x, TABLE_WIDTH / 2.0);
    }

    #[test]
    fn test_puck_bounces_inside_table() {
        let mut game = MatchState::new();
        game.puck.y = TABLE_HEIGHT / 2.0 + GOAL_HEIGHT;
        game.puck.vx = 9.0;
        game.puck.vy = 7.0;

        for _ in 0..600 {
            game.step();
            assert!(game.puck.y >= game.puck.r && game.puck.y <= TABLE_HEIGHT - game.puck.r);
        }
    }

    #[test]
    fn test_outgoing_move_is_mirrored() {
        let mut game = MatchState::new();
        game.me.x = 100.0;
        game.me.y = 150.0;
        game.puck.x = 300.0;
        game.puck.y = 200.0;
        game.puck.vx = 4.0;
        game.puck.vy = -2.0;

        let update = game.outgoing_move();
        assert_eq!(update.ox, Some(TABLE_WIDTH - 100.0));
        assert_eq!(update.oy, Some(150.0));
        assert_eq!(update.px, Some(TABLE_WIDTH - 300.0));
        assert_eq!(update.py, Some(200.0));
        assert_eq!(update.pvx, Some(-4.0));
        assert_eq!(update.pvy, Some(-2.0));
    }

    #[test]
    fn test_mirrored_move_round_trips_between_peers() {
        let mut alice = MatchState::new();
        alice.me.x = 120.0;
        let mut bob = MatchState::new();

        bob.apply_remote_move(&alice.outgoing_move());
        assert_eq!(bob.opp.x, TABLE_WIDTH - 120.0);

        alice.apply_remote_move(&bob.outgoing_move());
        assert_eq!(alice.opp.x, TABLE_WIDTH - bob.me.x);
    }

    #[test]
    fn test_remote_move_blends_puck() {
        let mut game = MatchState::new();
        game.puck.x = 100.0;
        game.puck.y = 100.0;

        game.apply_remote_move(&MoveUpdate {
            ox: Some(700.0),
            oy: Some(50.0),
            px: Some(200.0),
            py: Some(300.0),
            pvx: Some(10.0),
            pvy: Some(-10.0),
        });

        assert_eq!(game.opp.x, 700.0);
        assert_eq!(game.opp.y, 50.0);
        assert_approx_eq!(game.puck.x, 130.0, 1e-4);
        assert_approx_eq!(game.puck.y, 160.0, 1e-4);
        assert_approx_eq!(game.puck.vx, 3.0, 1e-4);
        assert_approx_eq!(game.puck.vy, -3.0, 1e-4);
    }

    #[test]
    fn test_partial_remote_move_keeps_local_values() {
        let mut game = MatchState::new();
        game.puck.x = 100.0;
        game.puck.vx = 2.0;
        let opp_before = game.opp.clone();

        game.apply_remote_move(&MoveUpdate {
            px: Some(200.0),
            ..Default::default()
        });

        assert_eq!(game.opp, opp_before);
        assert_approx_eq!(game.puck.x, 130.0, 1e-4);
        assert_approx_eq!(game.puck.vx, 2.0, 1e-6);
        assert_approx_eq!(game.puck.y, TABLE_HEIGHT / 2.0, 1e-6);
    }

    #[test]
    fn test_server_message_flow() {
        let mut game = MatchState::new();
        game.on_connected();
        assert!(game.connected);

        game.handle_server_message(ServerMessage::Created {
            code: "X1Y2Z".to_string(),
        });
        assert_eq!(game.code.as_deref(), Some("X1Y2Z"));
        assert_eq!(game.status, "Share code: X1Y2Z");
        assert!(!game.should_broadcast());

        game.puck.x = 42.0;
        game.handle_server_message(ServerMessage::Start);
        assert!(game.should_broadcast());
        assert_eq!(game.status, "Match started (X1Y2Z)");
        assert_eq!(game.puck.x, TABLE_WIDTH / 2.0);

        game.handle_server_message(ServerMessage::error("Peer disconnected"));
        assert_eq!(game.status, "Error: Peer disconnected");

        game.on_disconnected();
        assert!(!game.should_broadcast());
        assert_eq!(game.status, "Disconnected");
    }

    #[test]
    fn test_join_code_shown_on_start() {
        let mut game = MatchState::new();
        game.request_join("AB12C");
        game.handle_server_message(ServerMessage::Start);
        assert_eq!(game.status, "Match started (AB12C)");
    }

    #[test]
    fn test_copy_code() {
        let mut game = MatchState::new();
        let before = game.status.clone();
        assert_eq!(game.copy_code("   "), None);
        assert_eq!(game.status, before);

        assert_eq!(game.copy_code("AB12C"), Some("AB12C".to_string()));
        assert_eq!(game.status, "Code AB12C copied!");
    }

    #[test]
    fn test_tick_clock() {
        let mut clock = TickClock::new();
        let tick = 1.0 / TICK_RATE as f32;

        assert_eq!(clock.advance(tick * 0.5), 0);
        assert_eq!(clock.advance(tick * 0.6), 1);
        assert_eq!(clock.advance(tick * 2.0), 2);
        assert_eq!(clock.advance(10.0), 3);
    }
}

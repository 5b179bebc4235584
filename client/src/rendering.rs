use crate::game::MatchState;
use crate::input::CodeEntry;
use macroquad::prelude::*;
use shared::{Mallet, Puck, Rgb, GOAL_HEIGHT, SESSION_CODE_LEN, TABLE_HEIGHT, TABLE_WIDTH};

/// Height of the status bar drawn above the table
pub const HUD_HEIGHT: f32 = 40.0;

const TABLE_COLOR: Color = Color::new(0.08, 0.13, 0.24, 1.0);
const LINE_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.25);
const GOAL_COLOR: Color = Color::new(0.9, 0.22, 0.27, 1.0);

pub struct Renderer {
    origin: (f32, f32),
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            origin: (0.0, HUD_HEIGHT),
        }
    }

    /// Window size that fits the status bar and the table.
    pub fn window_size() -> (i32, i32) {
        (TABLE_WIDTH as i32, (TABLE_HEIGHT + HUD_HEIGHT) as i32)
    }

    /// Window position of the table's top-left corner.
    pub fn table_origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn render(&self, game: &MatchState, code_entry: &CodeEntry) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_table();
        self.draw_mallet(&game.opp);
        self.draw_mallet(&game.me);
        self.draw_puck(&game.puck);
        self.draw_hud(game, code_entry);
    }

    fn draw_table(&self) {
        let (ox, oy) = self.origin;

        draw_rectangle(ox, oy, TABLE_WIDTH, TABLE_HEIGHT, TABLE_COLOR);
        draw_rectangle_lines(ox, oy, TABLE_WIDTH, TABLE_HEIGHT, 2.0, LINE_COLOR);

        let mid_x = ox + TABLE_WIDTH / 2.0;
        draw_line(mid_x, oy, mid_x, oy + TABLE_HEIGHT, 2.0, LINE_COLOR);
        draw_circle_lines(mid_x, oy + TABLE_HEIGHT / 2.0, 50.0, 2.0, LINE_COLOR);

        let goal_top = oy + (TABLE_HEIGHT - GOAL_HEIGHT) / 2.0;
        draw_rectangle(ox, goal_top, 4.0, GOAL_HEIGHT, GOAL_COLOR);
        draw_rectangle(ox + TABLE_WIDTH - 4.0, goal_top, 4.0, GOAL_HEIGHT, GOAL_COLOR);
    }

    fn draw_mallet(&self, mallet: &Mallet) {
        let (x, y) = self.to_screen(mallet.x, mallet.y);
        draw_circle(x, y, mallet.r, to_color(mallet.color));
        draw_circle_lines(x, y, mallet.r * 0.5, 2.0, Color::from_rgba(0, 0, 0, 80));
    }

    fn draw_puck(&self, puck: &Puck) {
        let (x, y) = self.to_screen(puck.x, puck.y);
        draw_circle(x, y, puck.r, to_color(puck.color));
    }

    fn draw_hud(&self, game: &MatchState, code_entry: &CodeEntry) {
        let baseline = HUD_HEIGHT - 14.0;

        let connection_color = if game.connected { GREEN } else { RED };
        draw_rectangle(10.0, baseline - 8.0, 8.0, 8.0, connection_color);

        draw_text(&game.status, 26.0, baseline, 20.0, WHITE);

        let score = format!("{} : {}", game.score.me, game.score.opp);
        draw_text(&score, TABLE_WIDTH / 2.0 - 20.0, baseline, 26.0, WHITE);

        let mut typed = code_entry.as_str().to_string();
        while typed.len() < SESSION_CODE_LEN {
            typed.push('_');
        }
        draw_text(
            &format!("Code: {}", typed),
            TABLE_WIDTH - 140.0,
            baseline,
            20.0,
            Color::from_rgba(136, 136, 136, 255),
        );
    }

    fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin.0 + x, self.origin.1 + y)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::from_rgba(rgb.0, rgb.1, rgb.2, 255)
}

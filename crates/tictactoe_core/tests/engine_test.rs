//! Decision engine strength, checked against every opponent line.

use std::collections::HashMap;
use tictactoe_core::{
    Board, Cell, DecisionEngine, GameSession, GameStatus, Mark, NoThrottle, RandomThrottle,
    best_move, check_winner,
};

/// Game value for the side to move: 1 win, 0 draw, -1 loss.
fn solve(board: &Board, to_move: Mark, memo: &mut HashMap<(Board, Mark), i32>) -> i32 {
    if let Some(&value) = memo.get(&(*board, to_move)) {
        return value;
    }
    let value = if let Some(winner) = check_winner(board) {
        if winner == to_move { 1 } else { -1 }
    } else if board.is_full() {
        0
    } else {
        board
            .empty_cells()
            .into_iter()
            .map(|index| {
                let mut next = *board;
                next.set(index, Cell::Occupied(to_move));
                -solve(&next, to_move.opponent(), memo)
            })
            .max()
            .unwrap_or(0)
    };
    memo.insert((*board, to_move), value);
    value
}

/// Plays every human reply against the engine and returns the number of
/// finished games, failing if the engine ever loses.
fn engine_never_loses(game: &GameSession, computer: Mark) -> usize {
    let Some(mover) = game.turn().mark() else {
        return 0;
    };
    if mover == computer {
        let mut engine = DecisionEngine::playing(computer, NoThrottle);
        let index = engine.choose_move(game.board()).unwrap();
        let mut next = game.clone();
        next.apply_move(index, computer).unwrap();
        return settle(&next, computer);
    }
    game.board()
        .empty_cells()
        .into_iter()
        .map(|index| {
            let mut next = game.clone();
            next.apply_move(index, mover).unwrap();
            settle(&next, computer)
        })
        .sum()
}

fn settle(game: &GameSession, computer: Mark) -> usize {
    match game.status() {
        GameStatus::Won(winner) => {
            assert_eq!(winner, computer, "engine lost:\n{}", game.board().display());
            1
        }
        GameStatus::Draw => 1,
        GameStatus::InProgress => engine_never_loses(game, computer),
    }
}

#[test]
fn test_engine_as_o_never_loses() {
    let games = engine_never_loses(&GameSession::new(), Mark::O);
    assert!(games > 0);
}

#[test]
fn test_engine_as_x_never_loses() {
    let games = engine_never_loses(&GameSession::new(), Mark::X);
    assert!(games > 0);
}

#[test]
fn test_best_move_keeps_game_value_everywhere() {
    let mut memo = HashMap::new();
    let mut positions = vec![Board::new()];
    let mut seen = std::collections::HashSet::new();
    let mut checked = 0usize;

    while let Some(board) = positions.pop() {
        if !seen.insert(board) || check_winner(&board).is_some() || board.is_full() {
            continue;
        }
        let to_move = if board.count(Mark::X) == board.count(Mark::O) {
            Mark::X
        } else {
            Mark::O
        };

        let optimum = solve(&board, to_move, &mut memo);
        let chosen = best_move(&board, to_move, to_move.opponent()).unwrap();
        let mut after = board;
        after.set(chosen, Cell::Occupied(to_move));
        assert_eq!(
            -solve(&after, to_move.opponent(), &mut memo),
            optimum,
            "suboptimal {chosen} for {to_move} on\n{}",
            board.display()
        );
        checked += 1;

        for index in board.empty_cells() {
            let mut next = board;
            next.set(index, Cell::Occupied(to_move));
            positions.push(next);
        }
    }
    // Non-terminal positions reachable under X-first play.
    assert_eq!(checked, 4520);
}

#[test]
fn test_center_opening_answered_with_corner() {
    let mut board = Board::new();
    board.set(4, Cell::Occupied(Mark::X));
    assert!(matches!(best_move(&board, Mark::O, Mark::X), Some(0 | 2 | 6 | 8)));
}

#[test]
fn test_takes_win_over_block() {
    // X O X / X O . / . . .  O to move: 7 wins the middle column.
    let board = Board::from_cells([
        Cell::Occupied(Mark::X),
        Cell::Occupied(Mark::O),
        Cell::Occupied(Mark::X),
        Cell::Occupied(Mark::X),
        Cell::Occupied(Mark::O),
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
    ]);
    assert_eq!(best_move(&board, Mark::O, Mark::X), Some(7));
}

#[test]
fn test_full_throttle_still_plays_legal_cells() {
    let mut engine = DecisionEngine::playing(Mark::O, RandomThrottle::seeded(1.0, 42).unwrap());
    let mut game = GameSession::new();
    while game.is_running() {
        let mover = game.turn().mark().unwrap();
        let index = if mover == Mark::O {
            engine.choose_move(game.board()).unwrap()
        } else {
            game.board().empty_cells()[0]
        };
        game.apply_move(index, mover).unwrap();
    }
    assert!(game.status().is_terminal());
}

#[test]
fn test_seeded_throttle_is_reproducible() {
    let play = |seed| {
        let mut engine =
            DecisionEngine::playing(Mark::O, RandomThrottle::seeded(0.5, seed).unwrap());
        let mut board = Board::new();
        board.set(4, Cell::Occupied(Mark::X));
        (0..20)
            .map(|_| engine.choose_move(&board).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(play(7), play(7));
}

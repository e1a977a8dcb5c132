//! Obstacle-avoiding orthogonal routing.
//!
//! The search graph is sparse: its grid lines are the port stubs plus the
//! borders of every obstacle inflated by the clearance, clipped to a search
//! corridor. A* runs over (grid point, heading) states so bends can be
//! charged.

use std::{cmp::Ordering, collections::BinaryHeap};

use log::trace;

use c4_layout_core::geometry::{Bounds, EPSILON, Point};

use crate::routing::ports::{Port, Side};

const COST_SCALE: f32 = 10.0;

/// A box the route must stay out of, with its own clearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub bounds: Bounds,
    pub clearance: f32,
}

impl Obstacle {
    pub fn new(bounds: Bounds, clearance: f32) -> Self {
        Self { bounds, clearance }
    }

    fn inflated(&self) -> Bounds {
        self.bounds.inflate(self.clearance)
    }
}

/// Search limits for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub stub_length: f32,
    pub bend_penalty: f32,
    pub max_expansions: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridState {
    x: usize,
    y: usize,
    dir: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridEntry {
    est: u32,
    cost: u32,
    state: GridState,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| self.state.y.cmp(&other.state.y))
            .then_with(|| self.state.x.cmp(&other.state.x))
            .then_with(|| self.state.dir.cmp(&other.state.dir))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heading(side: Side) -> u8 {
    match side {
        Side::Top => 0,
        Side::Bottom => 1,
        Side::Left => 2,
        Side::Right => 3,
    }
}

const DIRS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

fn sorted_lines(mut values: Vec<f32>) -> Vec<f32> {
    values.sort_by(f32::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
    values
}

/// Merges repeated and collinear points.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|last| last.approx_eq(p)) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let vertical = (a.x() - b.x()).abs() <= EPSILON && (b.x() - p.x()).abs() <= EPSILON;
            let horizontal = (a.y() - b.y()).abs() <= EPSILON && (b.y() - p.y()).abs() <= EPSILON;
            if vertical || horizontal {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

/// Returns true if any segment of `points` passes through an obstacle box.
pub fn path_hits(points: &[Point], obstacles: &[Bounds]) -> bool {
    points
        .windows(2)
        .any(|seg| obstacles.iter().any(|o| o.intersects_segment(seg[0], seg[1])))
}

/// Finds an orthogonal path from `start` to `end` inside `corridor`.
///
/// Obstacles are kept out of by their clearance. `hard` boxes (typically the
/// endpoints themselves) are avoided without clearance. The path starts and
/// ends with a stub leaving each port along its normal.
pub fn route(
    start: Port,
    end: Port,
    obstacles: &[Obstacle],
    hard: &[Bounds],
    corridor: Bounds,
    params: SearchParams,
) -> Option<Vec<Point>> {
    let start_stub = start.stub(params.stub_length);
    let end_stub = end.stub(params.stub_length);

    let inside = |b: &Bounds| b.intersects(&corridor);
    let blocking: Vec<Bounds> = obstacles
        .iter()
        .map(Obstacle::inflated)
        .filter(inside)
        .chain(hard.iter().copied().filter(inside))
        .collect();

    let mut xs = vec![start_stub.x(), end_stub.x(), corridor.min_x(), corridor.max_x()];
    let mut ys = vec![start_stub.y(), end_stub.y(), corridor.min_y(), corridor.max_y()];
    for b in &blocking {
        xs.extend([b.min_x(), b.max_x()]);
        ys.extend([b.min_y(), b.max_y()]);
    }
    let clip = |v: &f32, lo: f32, hi: f32| *v >= lo - EPSILON && *v <= hi + EPSILON;
    let xs = sorted_lines(
        xs.into_iter()
            .filter(|v| clip(v, corridor.min_x(), corridor.max_x()))
            .collect(),
    );
    let ys = sorted_lines(
        ys.into_iter()
            .filter(|v| clip(v, corridor.min_y(), corridor.max_y()))
            .collect(),
    );

    let find = |lines: &[f32], v: f32| lines.iter().position(|l| (l - v).abs() <= EPSILON);
    let (sx, sy) = (find(&xs, start_stub.x())?, find(&ys, start_stub.y())?);
    let (ex, ey) = (find(&xs, end_stub.x())?, find(&ys, end_stub.y())?);

    let (cols, rows) = (xs.len(), ys.len());
    let point = |x: usize, y: usize| Point::new(xs[x], ys[y]);
    let is_terminal = |x: usize, y: usize| (x == sx && y == sy) || (x == ex && y == ey);

    let blocked_node: Vec<bool> = (0..rows)
        .flat_map(|y| (0..cols).map(move |x| (x, y)))
        .map(|(x, y)| {
            !is_terminal(x, y) && blocking.iter().any(|b| b.contains_point_strict(point(x, y)))
        })
        .collect();
    let segment_blocked = |a: Point, b: Point| blocking.iter().any(|o| o.intersects_segment(a, b));

    let turn_penalty = (params.bend_penalty * COST_SCALE).round() as u32;
    let heuristic = |x: usize, y: usize| {
        let p = point(x, y);
        (((p.x() - end_stub.x()).abs() + (p.y() - end_stub.y()).abs()) * COST_SCALE).round() as u32
    };

    let states = cols * rows * 4;
    let state_index = |s: GridState| (s.y * cols + s.x) * 4 + s.dir as usize;
    let mut best_cost = vec![u32::MAX; states];
    let mut prev: Vec<Option<GridState>> = vec![None; states];
    let mut heap = BinaryHeap::new();

    let origin = GridState {
        x: sx,
        y: sy,
        dir: heading(start.side),
    };
    best_cost[state_index(origin)] = 0;
    heap.push(GridEntry {
        est: heuristic(sx, sy),
        cost: 0,
        state: origin,
    });

    let mut end_state = None;
    let mut expansions = 0usize;
    while let Some(GridEntry { cost, state, .. }) = heap.pop() {
        expansions += 1;
        if expansions > params.max_expansions {
            trace!(expansions; "Route search exhausted its budget");
            break;
        }
        if cost != best_cost[state_index(state)] {
            continue;
        }
        if state.x == ex && state.y == ey {
            end_state = Some(state);
            break;
        }
        for (dir, (dx, dy)) in DIRS.iter().enumerate() {
            let (Some(nx), Some(ny)) = (
                state.x.checked_add_signed(*dx),
                state.y.checked_add_signed(*dy),
            ) else {
                continue;
            };
            if nx >= cols || ny >= rows || blocked_node[ny * cols + nx] {
                continue;
            }
            let (from, to) = (point(state.x, state.y), point(nx, ny));
            if segment_blocked(from, to) {
                continue;
            }
            let mut next_cost =
                cost.saturating_add((from.distance(to) * COST_SCALE).round() as u32);
            if state.dir != dir as u8 {
                next_cost = next_cost.saturating_add(turn_penalty);
            }
            let next = GridState {
                x: nx,
                y: ny,
                dir: dir as u8,
            };
            let index = state_index(next);
            if next_cost >= best_cost[index] {
                continue;
            }
            best_cost[index] = next_cost;
            prev[index] = Some(state);
            heap.push(GridEntry {
                est: next_cost.saturating_add(heuristic(nx, ny)),
                cost: next_cost,
                state: next,
            });
        }
    }

    let mut cur = end_state?;
    let mut cells = vec![point(cur.x, cur.y)];
    while let Some(p) = prev[state_index(cur)] {
        cells.push(point(p.x, p.y));
        cur = p;
    }
    cells.reverse();

    let mut points = Vec::with_capacity(cells.len() + 2);
    points.push(start.point);
    points.extend(cells);
    points.push(end.point);
    Some(compress_path(&points))
}

use tracing::debug;

use super::lattice::Lattice;
use super::scorer::Scorer;

/// Beam applied to the order-3 search once the position index exceeds
/// `begin_cut`: only the `top_num` best candidates at each of the two
/// previous positions are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beam {
    pub begin_cut: usize,
    pub top_num: usize,
}

/// Best path ending in candidate `index` at some position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    score: f64,
    /// Candidate index at the previous position.
    back: usize,
    index: usize,
}

impl Cell {
    fn empty(index: usize) -> Self {
        Self {
            score: 0.0,
            back: 0,
            index,
        }
    }
}

/// Candidate indices of the best path, one per lattice position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BestPath {
    pub indices: Vec<usize>,
    pub score: f64,
}

/// Max-product search over the lattice.
///
/// `order` ≥ 3 runs the pairwise search; anything lower runs the
/// order-2 search. Ties keep the first candidate that reached the maximum.
pub(crate) fn viterbi(
    lattice: &Lattice,
    scorer: &Scorer<'_>,
    order: usize,
    beam: Option<Beam>,
) -> BestPath {
    if lattice.is_empty() {
        return BestPath {
            indices: Vec::new(),
            score: 0.0,
        };
    }
    let table = if order >= 3 {
        viterbi3(lattice, scorer, beam)
    } else {
        viterbi2(lattice, scorer)
    };
    let path = backtrace(&table);
    debug!(score = path.score, "best path");
    path
}

fn initial(lattice: &Lattice, scorer: &Scorer<'_>) -> Vec<Cell> {
    lattice.columns[0]
        .iter()
        .enumerate()
        .map(|(index, &cur)| Cell {
            score: scorer.unigram(cur),
            back: 0,
            index,
        })
        .collect()
}

fn viterbi2(lattice: &Lattice, scorer: &Scorer<'_>) -> Vec<Vec<Cell>> {
    let columns = &lattice.columns;
    let mut table = Vec::with_capacity(columns.len());
    table.push(initial(lattice, scorer));

    for p in 1..columns.len() {
        let prev: &Vec<Cell> = &table[p - 1];
        let mut column: Vec<Cell> = (0..columns[p].len()).map(Cell::empty).collect();
        for (cell, &cur) in column.iter_mut().zip(&columns[p]) {
            for (last, &last_sym) in columns[p - 1].iter().enumerate() {
                let score = scorer.bigram(last_sym, cur) * prev[last].score;
                if cell.score < score {
                    cell.score = score;
                    cell.back = last;
                }
            }
        }
        table.push(column);
    }
    table
}

/// Order-3 search.
///
/// `pair[cur][last1]` holds the best path ending in `(last1, cur)`. After
/// each position the pair table is collapsed into one cell per `cur`,
/// which feeds backtrace and beam selection.
fn viterbi3(lattice: &Lattice, scorer: &Scorer<'_>, beam: Option<Beam>) -> Vec<Vec<Cell>> {
    let columns = &lattice.columns;
    let mut table = Vec::with_capacity(columns.len());
    table.push(initial(lattice, scorer));
    if columns.len() == 1 {
        return table;
    }

    // position 1 has no trigram context: bigram term carries alpha + beta
    let seed = scorer.seed_weight();
    let mut pair = vec![vec![0.0; columns[0].len()]; columns[1].len()];
    for &last1 in &expand(&table[0], 1, beam) {
        let last1_sym = columns[0][last1];
        let base = table[0][last1].score;
        for (cur, &cur_sym) in columns[1].iter().enumerate() {
            pair[cur][last1] = scorer.bigram_with(seed, last1_sym, cur_sym) * base;
        }
    }
    table.push(collapse(&pair));

    for p in 2..columns.len() {
        let last1_range = expand(&table[p - 1], p, beam);
        let last2_range = expand(&table[p - 2], p, beam);
        let mut next = vec![vec![0.0; columns[p - 1].len()]; columns[p].len()];

        for (cur, &cur_sym) in columns[p].iter().enumerate() {
            for &last1 in &last1_range {
                let last1_sym = columns[p - 1][last1];
                let best = &mut next[cur][last1];
                for &last2 in &last2_range {
                    let score = scorer.trigram(columns[p - 2][last2], last1_sym, cur_sym)
                        * pair[last1][last2];
                    if *best < score {
                        *best = score;
                    }
                }
            }
        }

        table.push(collapse(&next));
        pair = next;
    }
    table
}

/// Predecessor indices to expand at position `p`.
///
/// The beam ranks candidates by their collapsed per-candidate scores, not
/// by the joint `(last2, last1)` scores; it approximates the true top-K.
fn expand(prev: &[Cell], p: usize, beam: Option<Beam>) -> Vec<usize> {
    match beam {
        Some(beam) if p > beam.begin_cut => top_indices(prev, beam.top_num),
        _ => (0..prev.len()).collect(),
    }
}

/// Indices of the `k` best cells, returned in ascending index order.
fn top_indices(cells: &[Cell], k: usize) -> Vec<usize> {
    let mut ranked = cells.to_vec();
    // stable sort: equal scores keep the lower index first
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut picked: Vec<usize> = ranked.iter().take(k).map(|c| c.index).collect();
    picked.sort_unstable();
    picked
}

fn collapse(pair: &[Vec<f64>]) -> Vec<Cell> {
    pair.iter()
        .enumerate()
        .map(|(cur, row)| {
            let mut cell = Cell::empty(cur);
            for (last1, &score) in row.iter().enumerate() {
                if cell.score < score {
                    cell.score = score;
                    cell.back = last1;
                }
            }
            cell
        })
        .collect()
}

/// Follow backpointers from the best final cell.
///
/// When every final score is 0 the path starts from candidate 0 and still
/// follows the (zero-score) backpointers.
fn backtrace(table: &[Vec<Cell>]) -> BestPath {
    let mut best = Cell::empty(0);
    if let Some(last) = table.last() {
        for cell in last {
            if best.score < cell.score {
                best = *cell;
            }
        }
    }

    let mut indices = Vec::with_capacity(table.len());
    let mut cur = best.index;
    indices.push(cur);
    for column in table.iter().skip(1).rev() {
        cur = column[cur].back;
        indices.push(cur);
    }
    indices.reverse();

    BestPath {
        indices,
        score: best.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(scores: &[f64]) -> Vec<Cell> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| Cell {
                score,
                back: 0,
                index,
            })
            .collect()
    }

    #[test]
    fn top_indices_is_stable_and_sorted() {
        let c = cells(&[0.1, 0.5, 0.5, 0.0, 0.7]);
        assert_eq!(top_indices(&c, 2), vec![1, 4]);
        assert_eq!(top_indices(&c, 3), vec![1, 2, 4]);
        assert_eq!(top_indices(&c, 10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn expand_respects_cutoff() {
        let c = cells(&[0.1, 0.9, 0.3]);
        let beam = Some(Beam {
            begin_cut: 2,
            top_num: 1,
        });
        assert_eq!(expand(&c, 2, beam), vec![0, 1, 2]);
        assert_eq!(expand(&c, 3, beam), vec![1]);
        assert_eq!(expand(&c, 3, None), vec![0, 1, 2]);
    }

    #[test]
    fn collapse_keeps_first_maximum() {
        let collapsed = collapse(&[vec![0.2, 0.4, 0.4], vec![0.0, 0.0]]);
        assert_eq!(collapsed[0].score, 0.4);
        assert_eq!(collapsed[0].back, 1);
        assert_eq!(collapsed[1].score, 0.0);
        assert_eq!(collapsed[1].back, 0);
    }

    #[test]
    fn backtrace_zero_scores_falls_back_to_index_zero() {
        let mut last = cells(&[0.0, 0.0]);
        last[0].back = 1;
        let table = vec![cells(&[0.0, 0.0]), last];
        let path = backtrace(&table);
        assert_eq!(path.indices, vec![1, 0]);
        assert_eq!(path.score, 0.0);
    }

    #[test]
    fn backtrace_follows_pointers() {
        let first = cells(&[0.3, 0.6]);
        let mut second = cells(&[0.1, 0.2]);
        second[1].back = 1;
        let mut third = cells(&[0.05, 0.01]);
        third[0].back = 1;
        let path = backtrace(&[first, second, third]);
        assert_eq!(path.indices, vec![1, 1, 0]);
        assert_eq!(path.score, 0.05);
    }
}

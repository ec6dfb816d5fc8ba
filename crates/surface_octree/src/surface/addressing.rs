//! Lazily computed surface relations.
//!
//! Each relation lives in a `OnceLock` and is filled on first access; the two
//! cache structs are replaced wholesale when the surface changes. Reverse
//! relations go through [`Adjacency::reverse`] and edges through
//! [`count_then_write`], so all of them run on the current rayon pool.

use std::sync::OnceLock;

use glam::DVec3;
use rayon::prelude::*;

use super::graph::Adjacency;
use super::{Edge, TriSurface};
use crate::constants::VSMALL;
use crate::threading::count_then_write;

/// Connectivity relations; cleared when points or facets are added.
#[derive(Debug, Default)]
pub(crate) struct ConnectivityCache {
  point_facets: OnceLock<Adjacency>,
  edges: OnceLock<Vec<Edge>>,
  facet_edges: OnceLock<Vec<[usize; 3]>>,
  edge_facets: OnceLock<Adjacency>,
  point_edges: OnceLock<Adjacency>,
  facet_facets: OnceLock<Adjacency>,
}

/// Geometric relations; cleared when points move.
#[derive(Debug, Default)]
pub(crate) struct GeometryCache {
  facet_normals: OnceLock<Vec<DVec3>>,
  facet_centres: OnceLock<Vec<DVec3>>,
  point_normals: OnceLock<Vec<DVec3>>,
}

impl TriSurface {
  /// Facets incident to each point, ascending.
  pub fn point_facets(&self) -> &Adjacency {
    self
      .connectivity
      .point_facets
      .get_or_init(|| self.calculate_point_facets())
  }

  /// Every undirected edge exactly once, in the direction of its
  /// lowest-labelled facet, ordered by that facet.
  pub fn edges(&self) -> &[Edge] {
    self.connectivity.edges.get_or_init(|| self.calculate_edges())
  }

  /// Edge labels of each facet, aligned with [`Facet::edges`](super::Facet::edges).
  pub fn facet_edges(&self) -> &[[usize; 3]] {
    self
      .connectivity
      .facet_edges
      .get_or_init(|| self.calculate_facet_edges())
  }

  /// Facets incident to each edge, ascending.
  pub fn edge_facets(&self) -> &Adjacency {
    self
      .connectivity
      .edge_facets
      .get_or_init(|| Adjacency::reverse(self.edges().len(), self.facet_edges()))
  }

  /// Edges incident to each point, ascending.
  pub fn point_edges(&self) -> &Adjacency {
    self.connectivity.point_edges.get_or_init(|| {
      let ends: Vec<[usize; 2]> = self.edges().iter().map(|e| [e.start, e.end]).collect();
      Adjacency::reverse(self.n_points(), &ends)
    })
  }

  /// Facets sharing an edge with each facet, ascending, without the facet
  /// itself.
  pub fn facet_facets(&self) -> &Adjacency {
    self
      .connectivity
      .facet_facets
      .get_or_init(|| self.calculate_facet_facets())
  }

  /// Unit normal of each facet (zero for degenerate facets).
  pub fn facet_normals(&self) -> &[DVec3] {
    self.geometry.facet_normals.get_or_init(|| {
      (0..self.n_facets())
        .into_par_iter()
        .map(|f| self.facet_triangle(f).unit_normal())
        .collect()
    })
  }

  /// Vertex average of each facet.
  pub fn facet_centres(&self) -> &[DVec3] {
    self.geometry.facet_centres.get_or_init(|| {
      (0..self.n_facets())
        .into_par_iter()
        .map(|f| self.facet_triangle(f).centre())
        .collect()
    })
  }

  /// Normalised sum of the normals of the facets at each point; zero where the
  /// sum vanishes.
  pub fn point_normals(&self) -> &[DVec3] {
    self.geometry.point_normals.get_or_init(|| {
      let point_facets = self.point_facets();
      let facet_normals = self.facet_normals();
      (0..self.n_points())
        .into_par_iter()
        .map(|p| {
          let sum: DVec3 = point_facets.row(p).iter().map(|&f| facet_normals[f]).sum();
          let mag = sum.length();
          if mag > VSMALL {
            sum / mag
          } else {
            DVec3::ZERO
          }
        })
        .collect()
    })
  }

  fn calculate_point_facets(&self) -> Adjacency {
    let rows: Vec<[usize; 3]> = self.facets.iter().map(|f| f.vertices).collect();
    Adjacency::reverse(self.n_points(), &rows)
  }

  /// An edge of facet `f` is registered by `f` only when no lower facet at its
  /// start point contains it too, so each edge has exactly one owner and the
  /// workers never need to coordinate.
  fn calculate_edges(&self) -> Vec<Edge> {
    let point_facets = self.point_facets();
    let facets = &self.facets;

    count_then_write(facets.len(), |range, local| {
      for f in range {
        let local_edges = facets[f].edges();
        for (i, &edge) in local_edges.iter().enumerate() {
          if local_edges[..i].contains(&edge) {
            continue;
          }
          let owned_below = point_facets
            .row(edge.start)
            .iter()
            .take_while(|&&nf| nf < f)
            .any(|&nf| facets[nf].contains_edge(edge));
          if !owned_below {
            local.push(edge);
          }
        }
      }
    })
  }

  fn calculate_facet_edges(&self) -> Vec<[usize; 3]> {
    let edges = self.edges();
    let point_edges = self.point_edges();

    self
      .facets
      .par_iter()
      .map(|facet| {
        // Every facet edge has an owner, so the lookup always succeeds.
        facet.edges().map(|edge| {
          point_edges
            .row(edge.start)
            .iter()
            .copied()
            .find(|&e| edges[e] == edge)
            .unwrap_or(usize::MAX)
        })
      })
      .collect()
  }

  fn calculate_facet_facets(&self) -> Adjacency {
    let facet_edges = self.facet_edges();
    let edge_facets = self.edge_facets();

    let rows: Vec<Vec<usize>> = (0..self.n_facets())
      .into_par_iter()
      .map(|f| {
        let mut neighbours: Vec<usize> = facet_edges[f]
          .iter()
          .flat_map(|&e| edge_facets.row(e).iter().copied())
          .filter(|&nf| nf != f)
          .collect();
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours
      })
      .collect();

    Adjacency::from_rows(&rows)
  }
}

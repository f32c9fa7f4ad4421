//! The board model shared by every crate in the workspace: squares, pieces, positions, and the
//! text encodings used to talk to move-suggestion services.

use core::{fmt, str::FromStr};

mod fen;
mod moves;

pub use crate::fen::{encode, encode_with_counters, parse, FenError, Setup};
pub use crate::moves::{decode, Move, MoveParseError};

/// The types of pieces there are
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}
impl PieceKind {
    /// All the kinds of pieces there are
    pub const KINDS: [PieceKind; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// The kinds a pawn may become when it reaches the far rank
    pub const PROMOTIONS: [PieceKind; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// The capitalized version of the letter used for this piece in FEN
    pub const fn fen_letter(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// The kind named by a FEN letter, in either case
    pub const fn from_fen_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'R' => Some(Self::Rook),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }

    /// Whether a pawn can promote into this kind of piece
    pub const fn is_promotable(self) -> bool {
        match self {
            PieceKind::Pawn | PieceKind::King => false,
            PieceKind::Rook | PieceKind::Queen | PieceKind::Knight | PieceKind::Bishop => true,
        }
    }
}
impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown piece kind {0:?}")]
pub struct PieceKindParseError(String);

impl FromStr for PieceKind {
    type Err = PieceKindParseError;

    /// Accepts either the full name (`"queen"`) or the FEN letter (`"q"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let mut chars = lowered.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            return Self::from_fen_letter(letter).ok_or_else(|| PieceKindParseError(s.to_string()));
        }
        Self::KINDS
            .into_iter()
            .find(|kind| kind.to_string() == lowered)
            .ok_or_else(|| PieceKindParseError(s.to_string()))
    }
}

/// The two sides of the board
///
/// Light moves first and starts on the near ranks (rows 6 and 7).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Light,
    Dark,
}
impl Side {
    pub const fn other(self) -> Self {
        match self {
            Side::Light => Side::Dark,
            Side::Dark => Side::Light,
        }
    }

    pub const fn is_light(self) -> bool {
        matches!(self, Side::Light)
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Side::Dark)
    }

    /// The row delta of a single pawn step for this side
    pub const fn forward(self) -> i8 {
        match self {
            Side::Light => -1,
            Side::Dark => 1,
        }
    }

    /// The back rank, where the king and rooks start
    pub const fn home_row(self) -> u8 {
        match self {
            Side::Light => 7,
            Side::Dark => 0,
        }
    }

    /// The row on which this side's pawns start
    pub const fn pawn_row(self) -> u8 {
        match self {
            Side::Light => 6,
            Side::Dark => 1,
        }
    }

    /// The farthest row from this side, where its pawns promote
    pub const fn promotion_row(self) -> u8 {
        match self {
            Side::Light => 0,
            Side::Dark => 7,
        }
    }

    /// The active-side marker used in FEN
    pub const fn fen_letter(self) -> char {
        match self {
            Side::Light => 'w',
            Side::Dark => 'b',
        }
    }
}
impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Light => "light",
            Side::Dark => "dark",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown side {0:?}, expected light or dark")]
pub struct SideParseError(String);

impl FromStr for Side {
    type Err = SideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" | "white" | "w" => Ok(Side::Light),
            "dark" | "black" | "b" => Ok(Side::Dark),
            _ => Err(SideParseError(s.to_string())),
        }
    }
}

/// A piece standing on the board
///
/// `square` always equals the coordinates of the cell the piece is stored in; [`Position`] keeps
/// that true on every write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
    /// Whether this piece has moved at all this game (gates castling and the pawn double step)
    pub has_moved: bool,
    pub square: Square,
}
impl Piece {
    /// A piece that hasn't moved yet
    pub const fn new(kind: PieceKind, side: Side, square: Square) -> Self {
        Self {
            kind,
            side,
            has_moved: false,
            square,
        }
    }

    /// This piece after moving to `square`
    pub const fn moved_to(self, square: Square) -> Self {
        Self {
            has_moved: true,
            square,
            ..self
        }
    }

    pub const fn fen_letter(self) -> char {
        match self.side {
            Side::Light => self.kind.fen_letter().to_ascii_uppercase(),
            Side::Dark => self.kind.fen_letter().to_ascii_lowercase(),
        }
    }

    /// Whether this is a piece of the given kind and side, ignoring its history
    pub fn is(self, kind: PieceKind, side: Side) -> bool {
        self.kind == kind && self.side == side
    }
}

/// A square on the board
///
/// Stored in 0x88 form:
/// ```text
/// 0b12345678
///        +-+ Column (0 is file a)
///    +-+ Row (0 is the far rank, rank 8)
///   +   + Must be zero, invalid square if 1
/// ```
///
/// Each square fits in one byte, and anything that walks off the board lands on an invalid value
/// instead of wrapping around onto another square.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square(pub u8);
impl Square {
    /// An invalid square
    ///
    /// Please use this instead of making your own so it's obvious if a deliberately-invalid square
    /// appeared.
    pub const INVALID: Self = Self(0xee);

    pub const A8: Self = Self(0x00);
    pub const B8: Self = Self(0x01);
    pub const C8: Self = Self(0x02);
    pub const D8: Self = Self(0x03);
    pub const E8: Self = Self(0x04);
    pub const F8: Self = Self(0x05);
    pub const G8: Self = Self(0x06);
    pub const H8: Self = Self(0x07);
    pub const A7: Self = Self(0x10);
    pub const B7: Self = Self(0x11);
    pub const C7: Self = Self(0x12);
    pub const D7: Self = Self(0x13);
    pub const E7: Self = Self(0x14);
    pub const F7: Self = Self(0x15);
    pub const G7: Self = Self(0x16);
    pub const H7: Self = Self(0x17);
    pub const A6: Self = Self(0x20);
    pub const B6: Self = Self(0x21);
    pub const C6: Self = Self(0x22);
    pub const D6: Self = Self(0x23);
    pub const E6: Self = Self(0x24);
    pub const F6: Self = Self(0x25);
    pub const G6: Self = Self(0x26);
    pub const H6: Self = Self(0x27);
    pub const A5: Self = Self(0x30);
    pub const B5: Self = Self(0x31);
    pub const C5: Self = Self(0x32);
    pub const D5: Self = Self(0x33);
    pub const E5: Self = Self(0x34);
    pub const F5: Self = Self(0x35);
    pub const G5: Self = Self(0x36);
    pub const H5: Self = Self(0x37);
    pub const A4: Self = Self(0x40);
    pub const B4: Self = Self(0x41);
    pub const C4: Self = Self(0x42);
    pub const D4: Self = Self(0x43);
    pub const E4: Self = Self(0x44);
    pub const F4: Self = Self(0x45);
    pub const G4: Self = Self(0x46);
    pub const H4: Self = Self(0x47);
    pub const A3: Self = Self(0x50);
    pub const B3: Self = Self(0x51);
    pub const C3: Self = Self(0x52);
    pub const D3: Self = Self(0x53);
    pub const E3: Self = Self(0x54);
    pub const F3: Self = Self(0x55);
    pub const G3: Self = Self(0x56);
    pub const H3: Self = Self(0x57);
    pub const A2: Self = Self(0x60);
    pub const B2: Self = Self(0x61);
    pub const C2: Self = Self(0x62);
    pub const D2: Self = Self(0x63);
    pub const E2: Self = Self(0x64);
    pub const F2: Self = Self(0x65);
    pub const G2: Self = Self(0x66);
    pub const H2: Self = Self(0x67);
    pub const A1: Self = Self(0x70);
    pub const B1: Self = Self(0x71);
    pub const C1: Self = Self(0x72);
    pub const D1: Self = Self(0x73);
    pub const E1: Self = Self(0x74);
    pub const F1: Self = Self(0x75);
    pub const G1: Self = Self(0x76);
    pub const H1: Self = Self(0x77);

    /// Algebraic names, indexed by `row * 8 + col`
    const NAMES: [&'static str; 64] = [
        "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8", //
        "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7", //
        "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6", //
        "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5", //
        "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4", //
        "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3", //
        "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2", //
        "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", //
    ];

    /// Returns if this square is on the board
    ///
    /// ```
    /// # use board::Square;
    /// assert!(!Square::INVALID.is_valid());
    /// assert!(Square::H1.is_valid());
    /// ```
    pub const fn is_valid(self) -> bool {
        self.0 & 0x88 == 0
    }

    /// Produce a square from the row and column, returning [`Self::INVALID`] if either is off the
    /// board.
    ///
    /// ```
    /// # use board::Square;
    /// assert_eq!(Square::new(7, 4), Square::E1);
    /// assert_eq!(Square::new(-1, 4), Square::INVALID);
    /// assert_eq!(Square::new(0, 8), Square::INVALID);
    /// ```
    pub const fn new(row: i8, col: i8) -> Self {
        if 0 <= row && row < 8 && 0 <= col && col < 8 {
            Self((row as u8) << 4 | col as u8)
        } else {
            Self::INVALID
        }
    }

    /// Returns the `(row, col)` tuple if this square is valid
    pub const fn to_row_col(self) -> Option<(u8, u8)> {
        if self.is_valid() {
            Some((self.0 >> 4, self.0 & 0x07))
        } else {
            None
        }
    }

    /// The index of this square in row-major order, if valid
    pub const fn index(self) -> Option<usize> {
        match self.to_row_col() {
            Some((row, col)) => Some(row as usize * 8 + col as usize),
            None => None,
        }
    }

    /// Offset the given number of rows and columns.
    ///
    /// Walking off the board (or starting off it) gives [`Self::INVALID`].
    ///
    /// ```rust
    /// use board::Square;
    /// assert_eq!(Square::E4, Square::E2.offset(-2, 0));
    /// assert_eq!(Square::F7, Square::F7.offset(0, 0));
    /// assert!(!Square::D1.offset(1, 0).is_valid());
    /// assert!(!Square::A4.offset(0, -1).is_valid());
    /// ```
    pub const fn offset(self, rows: i8, cols: i8) -> Self {
        match self.to_row_col() {
            Some((row, col)) => {
                Self::new((row as i8).saturating_add(rows), (col as i8).saturating_add(cols))
            }
            None => Self::INVALID,
        }
    }

    /// The `(rows, cols)` needed to walk from `self` to `other`, if both are valid
    pub const fn delta_to(self, other: Self) -> Option<(i8, i8)> {
        match (self.to_row_col(), other.to_row_col()) {
            (Some((from_row, from_col)), Some((to_row, to_col))) => Some((
                to_row as i8 - from_row as i8,
                to_col as i8 - from_col as i8,
            )),
            _ => None,
        }
    }

    /// An iterator over all valid squares on the board, far rank first
    ///
    /// ```
    /// assert_eq!(board::Square::all_squares().count(), 64);
    /// ```
    pub fn all_squares() -> impl Iterator<Item = Self> {
        (0..64u8).map(|idx| Self((idx >> 3) << 4 | (idx & 0x07)))
    }

    /// The algebraic name of this square, if it is valid
    pub const fn as_str_legal(self) -> Option<&'static str> {
        match self.index() {
            Some(idx) => Some(Self::NAMES[idx]),
            None => None,
        }
    }

    /// The algebraic name of this square, or `"XX"` if invalid
    pub const fn as_str(self) -> &'static str {
        match self.as_str_legal() {
            Some(s) => s,
            None => "XX",
        }
    }
}
impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Square")
            .field("repr", &format_args!("{:X}", self.0))
            .field("readable", &self.as_str_legal().unwrap_or("illegal"))
            .finish()
    }
}
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("square name {0:?} was invalid")]
pub struct SquareParseError(pub String);

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareParseError(s.to_string()));
        }
        let col = match bytes[0] {
            file @ b'a'..=b'h' => file - b'a',
            _ => return Err(SquareParseError(s.to_string())),
        };
        let row = match bytes[1] {
            rank @ b'1'..=b'8' => b'8' - rank,
            _ => return Err(SquareParseError(s.to_string())),
        };
        Ok(Self(row << 4 | col))
    }
}

/// A pawn waiting on its owner to choose what it becomes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPromotion {
    pub square: Square,
    pub side: Side,
}

/// The state of a game, derived from the position and the side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    /// The given side is in check but has a way out
    Check(Side),
    /// The given side won
    Checkmate(Side),
    Stalemate,
}
impl GameState {
    /// Whether no further moves may be made
    pub const fn is_terminal(self) -> bool {
        matches!(self, GameState::Checkmate(_) | GameState::Stalemate)
    }
}
impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::InProgress => f.write_str("in progress"),
            GameState::Check(side) => write!(f, "{side} is in check"),
            GameState::Checkmate(winner) => write!(f, "checkmate, {winner} wins"),
            GameState::Stalemate => f.write_str("stalemate"),
        }
    }
}

/// An 8×8 grid of optional pieces
///
/// Positions are small `Copy` values: committing a move makes a new position from the old one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    cells: [Option<Piece>; 64],
}
impl Position {
    /// A board with no pieces on it
    pub const EMPTY: Self = Self { cells: [None; 64] };

    /// The setup at the start of a chess game
    pub fn initial() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut position = Self::EMPTY;
        for side in [Side::Light, Side::Dark] {
            for (col, kind) in BACK_RANK.into_iter().enumerate() {
                let home = Square::new(side.home_row() as i8, col as i8);
                let pawn = Square::new(side.pawn_row() as i8, col as i8);
                position.place(home, Piece::new(kind, side, home));
                position.place(pawn, Piece::new(PieceKind::Pawn, side, pawn));
            }
        }
        position
    }

    /// Find the piece, if any, at the given square
    ///
    /// Returns `None` if the given square is invalid.
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.index()?]
    }

    /// Whether the square is on the board and has nothing on it
    pub fn is_empty(&self, square: Square) -> bool {
        square.is_valid() && self.get(square).is_none()
    }

    /// Put `piece` on `square`, replacing whatever was there
    ///
    /// The stored piece's `square` is overwritten so it always agrees with where it is stored.
    /// Placing onto an invalid square does nothing.
    pub fn place(&mut self, square: Square, piece: Piece) {
        if let Some(idx) = square.index() {
            self.cells[idx] = Some(Piece { square, ..piece });
        }
    }

    /// Remove and return whatever is on `square`
    pub fn clear(&mut self, square: Square) -> Option<Piece> {
        self.cells[square.index()?].take()
    }

    /// Builder-style [`Self::place`], for setting up positions
    pub fn with(mut self, piece: Piece) -> Self {
        self.place(piece.square, piece);
        self
    }

    /// Every piece on the board, far rank first
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.cells.iter().filter_map(|cell| *cell)
    }

    /// Every piece belonging to `side`
    pub fn pieces_of(&self, side: Side) -> impl Iterator<Item = Piece> + '_ {
        self.pieces().filter(move |piece| piece.side == side)
    }

    /// Where `side`'s king stands, if it is on the board
    pub fn king_square(&self, side: Side) -> Option<Square> {
        self.pieces_of(side)
            .find(|piece| piece.kind == PieceKind::King)
            .map(|king| king.square)
    }
}
impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}
impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", fen::placement(self))
    }
}
/// Draws the board as eight lines of FEN letters, with `.` for empty squares
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for row in 0..8 {
            for col in 0..8 {
                f.write_char(
                    self.get(Square::new(row, col))
                        .map_or('.', |piece| piece.fen_letter()),
                )?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
